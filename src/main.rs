#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

use clap::{App, Arg};
use liubai::build::build_site;
use liubai::config::Config;
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("liubai")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Builds a minimalist personal blog into a static site")
        .arg(
            Arg::with_name("project")
                .help("The project directory; defaults to the current directory")
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("DIR")
                .help("The directory the site is written to")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("drafts")
                .long("drafts")
                .help("Include posts marked `draft: true`"),
        )
        .get_matches();

    let project = Path::new(matches.value_of("project").unwrap_or("."));
    let output = Path::new(matches.value_of("output").unwrap());

    let config = match Config::from_directory(project, output, matches.is_present("drafts")) {
        Ok(config) => config,
        Err(err) => fail(&err),
    };

    if let Err(err) = build_site(config) {
        fail(&err);
    }
}

fn fail(err: &dyn std::error::Error) -> ! {
    log::error!("{}", err);
    let mut source = err.source();
    while let Some(err) = source {
        log::error!("caused by: {}", err);
        source = err.source();
    }
    std::process::exit(1)
}
