use clap::{Arg, App};
use tracing_subscriber::EnvFilter;

use std::error::Error;
use std::path::Path;
use std::process;

use lpr_client::Lpr;
use lpr_client::annotate::{Annotator, FontResolver, DEFAULT_FONT_NAME};
use lpr_client::client::{HttpRecognitionClient, DEFAULT_ENDPOINT};


fn main() -> Result<(), Box<dyn Error>>{
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("lpr_client=info")))
        .init();

    let matches = App::new("LPR client")
                    .version("0.1.0")
                    .author("kingrong")
                    .about("Sends every image of a folder to a plate recognition service and writes the plate onto it")
                    .arg(Arg::with_name("INPUT")
                        .help("folder with vehicle images")
                        .required(true)
                        .index(1))
                    .arg(Arg::with_name("OUTPUT")
                        .help("folder the annotated images are written to")
                        .required(true)
                        .index(2))
                    .arg(Arg::with_name("endpoint")
                        .long("endpoint")
                        .env("LPR_ENDPOINT")
                        .takes_value(true)
                        .default_value(DEFAULT_ENDPOINT)
                        .help("recognition endpoint"))
                    .arg(Arg::with_name("font")
                        .long("font")
                        .env("LPR_FONT")
                        .takes_value(true)
                        .default_value(DEFAULT_FONT_NAME)
                        .help("font file or font name used for the plate text"))
                    .get_matches();
    let input = matches.value_of("INPUT").ok_or("input folder is required")?;
    let output = matches.value_of("OUTPUT").ok_or("output folder is required")?;
    let endpoint = matches.value_of("endpoint").unwrap_or(DEFAULT_ENDPOINT);
    let font = matches.value_of("font").unwrap_or(DEFAULT_FONT_NAME);

    if !Path::new(input).is_dir() {
        eprintln!("the specified path is not a directory: {}", input);
        process::exit(1);
    }

    let annotator = Annotator::from_resolver(&FontResolver::new(font));
    let lpr = Lpr::new(HttpRecognitionClient::new(endpoint), annotator, output);
    if let Err(e) = lpr.run(input) {
        eprintln!("could not process {}: {}", input, e);
        process::exit(1);
    }

    Ok(())
}
