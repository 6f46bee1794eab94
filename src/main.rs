use anyhow::{anyhow, Result};
use clap::{App as ClapApp, AppSettings, Arg, ArgMatches, SubCommand};
use eeu_complaints::api::resource::{Category, Priority, Status};
use eeu_complaints::api::{ComplaintFilters, DateFilter};
use eeu_complaints::app::{App, Command};
use eeu_complaints::config::Config;
use eeu_complaints::logger::{level_for, Logger};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let (name, sub) = matches.subcommand();
    let sub = sub.ok_or_else(|| anyhow!("No subcommand given"))?;

    let verbosity = matches.occurrences_of("verbose").max(sub.occurrences_of("verbose"));
    Logger::new(level_for(verbosity)).init()?;

    let mut config = Config::new();
    config.load(global_value(&matches, sub, "config"))?;
    if matches.is_present("demo") || sub.is_present("demo") {
        config.force_demo_mode = true;
    }

    let command = parse_command(name, sub)?;
    App::start(config, command).await
}

fn cli() -> ClapApp<'static, 'static> {
    ClapApp::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("DIR")
                .help("Directory holding config.yml")
                .takes_value(true)
                .global(true),
        )
        .arg(
            Arg::with_name("demo")
                .long("demo")
                .help("Answer from demo data without contacting the backend")
                .global(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity")
                .global(true),
        )
        .subcommand(SubCommand::with_name("health").about("Check the backend and report the service mode"))
        .subcommand(
            SubCommand::with_name("login")
                .about("Authenticate a user")
                .arg(Arg::with_name("email").long("email").takes_value(true).required(true))
                .arg(Arg::with_name("password").long("password").takes_value(true).required(true)),
        )
        .subcommand(
            SubCommand::with_name("complaints")
                .about("List complaints")
                .arg(Arg::with_name("status").long("status").takes_value(true))
                .arg(Arg::with_name("priority").long("priority").takes_value(true))
                .arg(Arg::with_name("category").long("category").takes_value(true))
                .arg(Arg::with_name("region").long("region").takes_value(true))
                .arg(
                    Arg::with_name("date")
                        .long("date")
                        .takes_value(true)
                        .possible_values(&["today", "yesterday", "thisweek", "thismonth"]),
                )
                .arg(Arg::with_name("search").long("search").takes_value(true)),
        )
        .subcommand(SubCommand::with_name("analytics").about("Print the analytics overview"))
        .subcommand(
            SubCommand::with_name("dashboard")
                .about("Refresh dashboard metrics, notifications and charts")
                .arg(Arg::with_name("region").long("region").takes_value(true))
                .arg(
                    Arg::with_name("watch")
                        .long("watch")
                        .help("Keep refreshing on the configured interval"),
                ),
        )
        .subcommand(
            SubCommand::with_name("transition")
                .about("Change a complaint's status")
                .arg(Arg::with_name("id").required(true).index(1))
                .arg(Arg::with_name("to").required(true).index(2))
                .arg(Arg::with_name("note").long("note").takes_value(true)),
        )
        .subcommand(SubCommand::with_name("proxy").about("Serve the development and function proxies"))
        .subcommand(SubCommand::with_name("config").about("Print the effective configuration"))
}

fn global_value<'a>(matches: &'a ArgMatches, sub: &'a ArgMatches, name: &str) -> Option<&'a str> {
    sub.value_of(name).or_else(|| matches.value_of(name))
}

fn parse_command(name: &str, matches: &ArgMatches) -> Result<Command> {
    let text = |key: &str| matches.value_of(key).map(str::to_string);
    let command = match name {
        "health" => Command::Health,
        "login" => Command::Login {
            email: text("email").unwrap_or_default(),
            password: text("password").unwrap_or_default(),
        },
        "complaints" => Command::Complaints(ComplaintFilters {
            status: parsed(matches, "status", Status::parse)?,
            priority: parsed(matches, "priority", Priority::parse)?,
            category: parsed(matches, "category", Category::parse)?,
            region: text("region"),
            date_filter: parsed(matches, "date", DateFilter::parse)?,
            search: text("search"),
        }),
        "analytics" => Command::Analytics,
        "dashboard" => Command::Dashboard {
            region: text("region"),
            watch: matches.is_present("watch"),
        },
        "transition" => Command::Transition {
            complaint_id: text("id").unwrap_or_default(),
            to: parsed(matches, "to", Status::parse)?
                .ok_or_else(|| anyhow!("Target status is required"))?,
            note: text("note"),
        },
        "proxy" => Command::Proxy,
        "config" => Command::Config,
        other => return Err(anyhow!("Unknown command: {}", other)),
    };
    Ok(command)
}

fn parsed<T>(matches: &ArgMatches, key: &str, parse: fn(&str) -> Option<T>) -> Result<Option<T>> {
    match matches.value_of(key) {
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| anyhow!("Invalid --{}: {}", key, raw)),
        None => Ok(None),
    }
}
