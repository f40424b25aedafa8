use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use limbic::{
    ArtifactConfig, ArtifactLoader, RecordStore, SentimentClassifier, SubmissionPipeline,
    TextEncoder,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the trained ONNX model
    #[arg(long, default_value = "ai/model.onnx")]
    model: PathBuf,

    /// Path to the tokenizer paired with the model
    #[arg(long, default_value = "ai/tokenizer.json")]
    tokenizer: PathBuf,

    /// Input width of the model, in token positions
    #[arg(long, default_value_t = 469)]
    sequence_length: usize,

    /// Path to the complaints database
    #[arg(long, default_value = "complaints.db")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one complaint and record it
    Submit {
        /// Submitter id (exactly 10 characters)
        #[arg(long)]
        id: String,
        /// Complaint text
        #[arg(long)]
        text: String,
    },
    /// Print every recorded complaint
    List,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let store = RecordStore::new(&args.db);
    store.ensure_schema()?;

    match args.command {
        Command::Submit { id, text } => {
            let start = Instant::now();
            let loader = ArtifactLoader::new(ArtifactConfig::new(
                &args.model,
                &args.tokenizer,
                args.sequence_length,
            ));
            let artifact = loader.load()?;
            info!("artifact ready (took {:.2?})", start.elapsed());

            let pipeline = SubmissionPipeline::new(
                TextEncoder::new(&artifact),
                SentimentClassifier::new(&artifact),
                store,
            );
            let outcome = pipeline.submit(&id, &text)?;
            println!("{} ({}%)", outcome.label, outcome.confidence);
        }
        Command::List => {
            let records = store.list_all()?;
            let [author, complaint, sentiment, confidence] = RecordStore::DISPLAY_COLUMNS;
            println!("{author:<12} {complaint:<100} {sentiment:<10} {confidence}");
            for record in records {
                println!(
                    "{:<12} {:<100} {:<10} {}",
                    record.submitter_id, record.text, record.label, record.confidence
                );
            }
        }
    }

    Ok(())
}
