use clap::{Parser, Subcommand};
use regex::Regex;
use std::path::{Path, PathBuf};

use docxside_writer::{
    Block, Content, CoreProperties, DEFAULT_WINDOW, Error, FileCounter, Language, Package, Picture,
};

#[derive(Parser)]
#[command(name = "docxside-writer", about = "Build and edit DOCX report packages")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the text of every paragraph
    Text { input: PathBuf },
    /// List the parts of a package
    Entries { input: PathBuf },
    /// Report whether a pattern occurs, matching across split runs
    Search {
        input: PathBuf,
        pattern: String,
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
    },
    /// Replace a pattern and save the result as a new package
    Replace {
        input: PathBuf,
        pattern: String,
        replacement: String,
        /// Output DOCX file (defaults to <input>-replaced.docx)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_WINDOW)]
        window: usize,
        /// Only replace inside single text runs
        #[arg(long)]
        simple: bool,
        #[command(flatten)]
        properties: PropertyArgs,
    },
    /// Build a report from headings, paragraphs and images given in order
    Build {
        output: PathBuf,
        /// Merge into this template instead of the built-in skeleton
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        heading: Option<String>,
        #[arg(long = "paragraph")]
        paragraphs: Vec<String>,
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Display width of each image in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Use Dutch style names (Kop, Bijschrift)
        #[arg(long)]
        dutch: bool,
        /// Figure sequence file (defaults to $DOCX_SEQ_FILE or <tmp>/docx_seq)
        #[arg(long)]
        seq_file: Option<PathBuf>,
        #[command(flatten)]
        properties: PropertyArgs,
    },
}

#[derive(clap::Args)]
struct PropertyArgs {
    #[arg(long, default_value = "")]
    title: String,
    #[arg(long, default_value = "")]
    subject: String,
    #[arg(long)]
    creator: Option<String>,
    #[arg(long = "keyword")]
    keywords: Vec<String>,
}

impl PropertyArgs {
    fn into_properties(self) -> CoreProperties {
        let mut props = CoreProperties {
            title: self.title,
            subject: self.subject,
            keywords: self.keywords,
            ..Default::default()
        };
        if let Some(creator) = self.creator {
            props.creator = creator;
        }
        props
    }
}

fn require_file(path: &Path) {
    if !path.exists() {
        eprintln!("Error: file not found: {}", path.display());
        std::process::exit(1);
    }
    if !path.is_file() {
        eprintln!("Error: not a file: {}", path.display());
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Error> {
    match command {
        Command::Text { input } => {
            require_file(&input);
            for paragraph in docxside_writer::read_text(&input)? {
                println!("{paragraph}");
            }
        }
        Command::Entries { input } => {
            require_file(&input);
            println!("{:>9}  path", "bytes");
            for (name, size) in docxside_writer::list_parts(&input)? {
                println!("{size:>9}  {name}");
            }
        }
        Command::Search { input, pattern, window } => {
            require_file(&input);
            let pattern = Regex::new(&pattern)?;
            let package = Package::open(&input)?;
            let found = docxside_writer::advanced_search(package.document(), &pattern, window);
            if found.is_empty() {
                eprintln!("No matches for '{pattern}'");
                std::process::exit(1);
            }
            for m in found {
                println!("{m}");
            }
        }
        Command::Replace { input, pattern, replacement, output, window, simple, properties } => {
            require_file(&input);
            let pattern = Regex::new(&pattern)?;
            let output = output.unwrap_or_else(|| {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                input.with_file_name(format!("{stem}-replaced.docx"))
            });
            let mut package = Package::open(&input)?;
            let count = if simple {
                docxside_writer::replace(package.document_mut(), &pattern, &replacement)
            } else {
                docxside_writer::advanced_replace(
                    package.document_mut(),
                    &pattern,
                    &Content::Text(replacement),
                    window,
                )
            };
            println!("{count} replacement(s)");
            let relationships = package.relationships();
            package.save(&properties.into_properties(), &relationships, &output)?;
        }
        Command::Build {
            output,
            template,
            heading,
            paragraphs,
            images,
            width,
            dutch,
            seq_file,
            properties,
        } => {
            if let Some(template) = &template {
                require_file(template);
            }
            let language = if dutch { Language::Dutch } else { Language::English };
            let mut blocks = Vec::new();
            if let Some(text) = heading {
                blocks.push(Block::Heading { text, level: 1, language });
            }
            blocks.extend(paragraphs.into_iter().map(Block::paragraph));
            for image in images {
                require_file(&image);
                let name = image
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let mut picture = Picture::new(&image, name.clone());
                if let Some(w) = width {
                    picture = picture.width(w);
                }
                blocks.push(Block::Picture(picture));
                blocks.push(Block::FigureCaption { text: name, language });
            }
            let mut counter = match seq_file {
                Some(path) => FileCounter::new(path),
                None => FileCounter::from_env(),
            };
            docxside_writer::build_report(
                blocks,
                template.as_deref(),
                &properties.into_properties(),
                &mut counter,
                &output,
            )?;
        }
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(args.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
