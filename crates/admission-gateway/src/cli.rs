use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("ADMISSION_GATEWAY_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("ADMISSION_GATEWAY_LOG_FMT")
            .default_value("json")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("ADMISSION_GATEWAY_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8443")
            .env("ADMISSION_GATEWAY_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("ADMISSION_GATEWAY_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("ADMISSION_GATEWAY_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("webhook-path")
            .long("webhook-path")
            .value_name("PATH")
            .default_value(crate::config::DEFAULT_WEBHOOK_PATH)
            .env("ADMISSION_GATEWAY_WEBHOOK_PATH")
            .help("HTTP path serving the admission reviews"),
        Arg::new("ignore-namespace")
            .long("ignore-namespace")
            .value_name("NAMESPACE")
            .env("ADMISSION_GATEWAY_IGNORE_NAMESPACES")
            .action(ArgAction::Append)
            .value_delimiter(',')
            .required(false)
            .help("Always accept the admission reviews targeting NAMESPACE. Replaces the default list (kube-system, kube-public)"),
        Arg::new("max-body-size")
            .long("max-body-size")
            .value_name("BYTES")
            .default_value("2097152")
            .env("ADMISSION_GATEWAY_MAX_BODY_SIZE")
            .value_parser(clap::value_parser!(usize))
            .help("Maximum size of an admission review request body"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
