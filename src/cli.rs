// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn type_arg() -> Arg {
    opt("type", "expense | income | excluded")
        .value_parser(["expense", "income", "excluded"])
        .ignore_case(true)
}

pub fn build_cli() -> Command {
    Command::new("billbook")
        .about("Personal bill ledger: owners, payment methods, categories and bills")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(std::path::PathBuf))
                .help("Database file (defaults to the platform data dir)"),
        )
        .subcommand(Command::new("init").about("Create the database and seed defaults"))
        .subcommand(
            Command::new("owner")
                .about("Manage owners")
                .subcommand(
                    Command::new("add").arg(Arg::new("name").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(type_arg().default_value("expense")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("method")
                .about("Manage payment methods")
                .subcommand(
                    Command::new("add-savings")
                        .arg(req("owner", "Owner name"))
                        .arg(req("name", "Account name"))
                        .arg(opt("balance", "Opening balance").default_value("0")),
                )
                .subcommand(
                    Command::new("add-credit")
                        .arg(req("owner", "Owner name"))
                        .arg(req("name", "Card name"))
                        .arg(req("limit", "Credit limit"))
                        .arg(
                            opt("billing-date", "Statement day of month (1-31)")
                                .value_parser(value_parser!(u8))
                                .default_value("1"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(opt("owner", "Only this owner's methods")),
                )),
        )
        .subcommand(
            Command::new("bill")
                .about("Record and manage bills")
                .subcommand(
                    Command::new("add")
                        .arg(req("owner", "Owner name"))
                        .arg(req("method", "Payment method name"))
                        .arg(req("amount", "Amount"))
                        .arg(req("categories", "Comma-separated category names"))
                        .arg(type_arg().default_value("expense"))
                        .arg(opt("date", "YYYY-MM-DD[ HH:MM[:SS]] (defaults to now)"))
                        .arg(opt("note", "Free text")),
                )
                .subcommand(
                    Command::new("edit")
                        .arg(
                            Arg::new("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(opt("amount", "New amount"))
                        .arg(type_arg())
                        .arg(opt("method", "New payment method name (same owner)"))
                        .arg(opt("categories", "Replace categories"))
                        .arg(opt("date", "New date"))
                        .arg(opt("note", "New note").conflicts_with("clear-note"))
                        .arg(
                            Arg::new("clear-note")
                                .long("clear-note")
                                .action(ArgAction::SetTrue),
                        ),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("owner", "Owner name"))
                        .arg(opt("method", "Payment method name (needs --owner)"))
                        .arg(type_arg())
                        .arg(opt("category", "Category name"))
                        .arg(opt("from", "YYYY-MM-DD inclusive"))
                        .arg(opt("to", "YYYY-MM-DD inclusive"))
                        .arg(opt("limit", "Max rows").value_parser(value_parser!(usize))),
                )),
        )
        .subcommand(
            Command::new("import").about("Import data").subcommand(
                Command::new("bills").arg(req("path", "CSV file")),
            ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("bills")
                    .arg(
                        opt("format", "csv | json")
                            .value_parser(["csv", "json"])
                            .default_value("csv"),
                    )
                    .arg(req("out", "Output file")),
            ),
        )
        .subcommand(
            Command::new("backup")
                .about("Snapshot backups")
                .arg(
                    Arg::new("dir")
                        .long("dir")
                        .global(true)
                        .value_parser(value_parser!(std::path::PathBuf))
                        .help("Backup directory"),
                )
                .subcommand(Command::new("create"))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("restore").arg(
                        Arg::new("path")
                            .required(true)
                            .value_parser(value_parser!(std::path::PathBuf)),
                    ),
                )
                .subcommand(
                    Command::new("watch")
                        .about("Back up on the configured interval until interrupted"),
                ),
        )
        .subcommand(json_flags(
            Command::new("stats")
                .about("Totals and breakdowns")
                .arg(opt("owner", "Owner name"))
                .arg(opt("from", "YYYY-MM-DD inclusive"))
                .arg(opt("to", "YYYY-MM-DD inclusive")),
        ))
        .subcommand(
            Command::new("quick")
                .about("Record a preset expense")
                .arg(opt("owner", "Owner name (defaults to default_owner)"))
                .arg(opt("item", "Preset label, e.g. Coffee").required_unless_present("list"))
                .arg(opt("date", "YYYY-MM-DD[ HH:MM[:SS]] (defaults to now)"))
                .arg(
                    Arg::new("list")
                        .long("list")
                        .action(ArgAction::SetTrue)
                        .help("Show the preset items"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Runtime settings")
                .subcommand(Command::new("get").arg(Arg::new("key")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check referential integrity"))
}
