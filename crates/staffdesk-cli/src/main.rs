// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use runtime::HttpRuntime;
use staffdesk_app::ResourceKind;
use staffdesk_client::Client;
use staffdesk_db::Store;
use staffdesk_server::ApiServer;
use std::env;
use std::path::{Path, PathBuf};
use std::thread;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `staffdesk --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    if options.demo {
        return run_demo(&config, &options);
    }

    if options.serve || options.check_only {
        let store = open_store(&db_path)?;
        if options.check_only {
            build_client(&config, options.url.as_deref())?;
            return Ok(());
        }

        logging::init_stderr(config.log_filter())?;
        let server = ApiServer::bind(config.server_bind(), store)?;
        tracing::info!(
            addr = %server.local_addr()?,
            db = %db_path.display(),
            "REST server ready"
        );
        return server.serve();
    }

    let _guard = logging::init_file(&config.log_dir()?, config.log_filter())?;
    let client = build_client(&config, options.url.as_deref())?;
    tracing::info!(base_url = client.base_url(), "attaching to server");
    let mut runtime = HttpRuntime::new(client);
    staffdesk_tui::run_app(initial_table(&options), &mut runtime)
}

fn run_demo(config: &Config, options: &CliOptions) -> Result<()> {
    let store = Store::open_memory()?;
    store.bootstrap()?;
    store.seed_demo_data()?;

    let server = ApiServer::bind("127.0.0.1:0", store)?;
    let base_url = format!("http://{}", server.local_addr()?);
    let client = Client::new(&base_url, config.client_timeout()?)?;
    if options.check_only {
        return Ok(());
    }

    let _guard = logging::init_file(&config.log_dir()?, config.log_filter())?;
    thread::Builder::new()
        .name("demo-server".to_owned())
        .spawn(move || {
            if let Err(error) = server.serve() {
                tracing::error!(error = %format!("{error:#}"), "demo server stopped");
            }
        })
        .context("spawn demo server")?;

    tracing::info!(base_url = client.base_url(), "demo server ready");
    let mut runtime = HttpRuntime::new(client);
    staffdesk_tui::run_app(initial_table(options), &mut runtime)
}

fn open_store(db_path: &Path) -> Result<Store> {
    let store = Store::open(db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or STAFFDESK_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    Ok(store)
}

fn build_client(config: &Config, url_override: Option<&str>) -> Result<Client> {
    let base_url = url_override.unwrap_or_else(|| config.client_base_url());
    Client::new(base_url, config.client_timeout()?)
        .context("invalid [client] config; fix base_url/timeout values or pass --url")
}

fn initial_table(options: &CliOptions) -> ResourceKind {
    options.table.unwrap_or(ResourceKind::Employees)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    print_example: bool,
    demo: bool,
    serve: bool,
    check_only: bool,
    show_help: bool,
    url: Option<String>,
    table: Option<ResourceKind>,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_db_path: false,
        print_example: false,
        demo: false,
        serve: false,
        check_only: false,
        show_help: false,
        url: None,
        table: None,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--url" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--url requires a base URL such as http://127.0.0.1:39393"))?;
                options.url = Some(value.as_ref().to_owned());
            }
            "--table" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--table requires a resource name"))?;
                let kind = ResourceKind::parse(value.as_ref()).ok_or_else(|| {
                    anyhow!(
                        "unknown table {:?}; expected one of {}",
                        value.as_ref(),
                        table_names()
                    )
                })?;
                options.table = Some(kind);
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--serve" => {
                options.serve = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.serve && options.demo {
        return Err(anyhow!(
            "--serve and --demo are exclusive; --demo already serves an in-memory database"
        ));
    }

    Ok(options)
}

fn table_names() -> String {
    ResourceKind::ALL
        .iter()
        .map(|kind| kind.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_help() {
    println!("staffdesk");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a config template");
    println!("  --serve                  Run the REST server in the foreground");
    println!("  --demo                   Serve seeded demo data (in-memory) and open the tables");
    println!("  --url <base>             Attach to a server other than [client].base_url");
    println!("  --table <name>           Open on a table ({})", table_names());
    println!("  --check                  Validate config + DB + client, then exit");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use anyhow::Result;
    use staffdesk_app::ResourceKind;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/staffdesk-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                print_config_path: false,
                print_db_path: false,
                print_example: false,
                demo: false,
                serve: false,
                check_only: false,
                show_help: false,
                url: None,
                table: None,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--url"], default_options_path())
            .expect_err("missing url value should fail");
        assert!(error.to_string().contains("--url requires a base URL"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_reads_url_and_table() -> Result<()> {
        let options = parse_cli_args(
            vec!["--url", "http://10.0.0.5:8080", "--table", "project_employees"],
            default_options_path(),
        )?;
        assert_eq!(options.url.as_deref(), Some("http://10.0.0.5:8080"));
        assert_eq!(options.table, Some(ResourceKind::ProjectEmployees));
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_unknown_table() {
        let error = parse_cli_args(vec!["--table", "vendors"], default_options_path())
            .expect_err("unknown table should fail");
        let message = error.to_string();
        assert!(message.contains("vendors"));
        assert!(message.contains("employee_positions"));
    }

    #[test]
    fn parse_cli_args_sets_mode_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--serve", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(!options.print_db_path);
        assert!(options.print_example);
        assert!(options.serve);
        assert!(!options.demo);
        assert!(options.check_only);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_serve_with_demo() {
        let error = parse_cli_args(vec!["--serve", "--demo"], default_options_path())
            .expect_err("serve and demo together should fail");
        assert!(error.to_string().contains("exclusive"));
    }

    #[test]
    fn parse_cli_args_sets_help_for_short_flag() -> Result<()> {
        let options = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(options.show_help);
        Ok(())
    }
}
