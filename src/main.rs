use brainfilter::BrainFilterError;
use brainfilter::batch::run_batch;
use brainfilter::classify::Classifier;
use brainfilter::cli::{Cli, Command};
use brainfilter::config::{self, BrainFilterConfig};
use brainfilter::model;
use brainfilter::policy::{self, VideoEntry};
use brainfilter::text;
use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;

fn classifier_for(cli_model: Option<&str>, config: &BrainFilterConfig) -> Classifier {
    let source = model::resolve_source(cli_model, &config.model);
    Classifier::new(source, Duration::from_secs(config.model.timeout_secs))
}

fn run() -> Result<(), BrainFilterError> {
    let cli = Cli::parse();
    let config = config::load_config()?;

    match cli.command {
        Command::Classify(args) => {
            let mut classifier = classifier_for(cli.model.as_deref(), &config);
            classifier.ensure_loaded()?;
            for title in &args.titles {
                let prediction = classifier.predict(title)?;
                if args.json {
                    println!("{}", serde_json::to_string(&prediction)?);
                } else {
                    println!("{}\t{:.4}\t{title}", prediction.category, prediction.score);
                }
            }
        }
        Command::Check(args) => {
            let mut classifier = classifier_for(cli.model.as_deref(), &config);
            let hour = args.hour.unwrap_or_else(policy::current_hour);
            let entry = VideoEntry {
                title: Some(args.title),
                channel: args.channel,
                short: args.short,
            };
            let verdict = policy::evaluate(&mut classifier, &entry, hour, &config.filter);
            let action = if verdict.filter { "filter" } else { "allow" };
            println!("{action}\t{}", verdict.reason);
        }
        Command::Batch(args) => {
            let mut classifier = classifier_for(cli.model.as_deref(), &config);
            let hour = args.hour.unwrap_or_else(policy::current_hour);
            let stdin = std::io::stdin().lock();
            let stdout = std::io::stdout().lock();
            run_batch(stdin, stdout, &mut classifier, &config.filter, hour)?;
        }
        Command::Inspect => {
            let mut classifier = classifier_for(cli.model.as_deref(), &config);
            let source = classifier
                .source()
                .map(ToString::to_string)
                .unwrap_or_default();
            let m = classifier.ensure_loaded()?;
            let [lo, hi] = m.ngram_range();
            println!("source:      {source}");
            println!("model type:  {}", m.model_type().unwrap_or("unknown"));
            println!("hash:        {}", m.hash());
            println!("features:    {}", m.n_features());
            match m.max_features() {
                Some(max) => println!("max features: {max}"),
                None => println!("max features: unbounded"),
            }
            println!("ngram range: {lo}..={hi}");
            println!("classes:     {} ({})", m.n_classes(), m.classes().join(", "));
        }
        Command::Tokenize(args) => {
            for token in text::tokenize(&args.text) {
                println!("{token}");
            }
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("brainfilter: {e}");
            ExitCode::from(1)
        }
    }
}
