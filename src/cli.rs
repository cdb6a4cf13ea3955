// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(clap::value_parser!(i64))
        .help("Record id")
}

fn budget_fields(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("category")
            .long("category")
            .required(true)
            .value_parser(clap::value_parser!(i64))
            .help("Category id"),
    )
    .arg(Arg::new("amount").long("amount").required(true).help("Target amount"))
    .arg(Arg::new("start").long("start").required(true).help("YYYY-MM-DD"))
    .arg(Arg::new("end").long("end").required(true).help("YYYY-MM-DD"))
}

fn goal_fields(cmd: Command, required: bool) -> Command {
    cmd.arg(Arg::new("name").long("name").required(required))
        .arg(Arg::new("target").long("target").required(required).help("Target amount"))
        .arg(
            Arg::new("priority")
                .long("priority")
                .required(required)
                .value_parser(clap::value_parser!(i64))
                .help("1 is funded first"),
        )
        .arg(Arg::new("date").long("date").required(required).help("Target date YYYY-MM-DD"))
}

fn window_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("start").long("start").required(true).help("YYYY-MM-DD"))
        .arg(Arg::new("end").long("end").required(true).help("YYYY-MM-DD"))
}

fn transaction_fields(cmd: Command) -> Command {
    cmd.arg(Arg::new("date").long("date").required(true))
        .arg(Arg::new("amount").long("amount").required(true).allow_hyphen_values(true))
        .arg(Arg::new("bank").long("bank").required(true))
        .arg(Arg::new("category").long("category").required(true).help("Category id or name"))
        .arg(Arg::new("description").long("description"))
        .arg(Arg::new("ref").long("ref").help("Bank reference number"))
}

pub fn build_cli() -> Command {
    command!()
        .name("moneycast")
        .about("Cash-flow forecasting, subscription detection and savings goals")
        .arg(
            Arg::new("user")
                .long("user")
                .global(true)
                .env("MONEYCAST_USER")
                .help("Owning user id; every query is scoped to it"),
        )
        .arg(
            Arg::new("local")
                .long("local")
                .global(true)
                .num_args(0..=1)
                .default_missing_value("")
                .help("Use a local SQLite store (optional path) instead of NocoDB"),
        )
        .subcommand(json_flags(
            Command::new("forecast").about("Day-by-day balance forecast").arg(
                Arg::new("days")
                    .long("days")
                    .value_parser(clap::value_parser!(u32))
                    .help("Horizon in days (default 30, at most 3660)"),
            ),
        ))
        .subcommand(json_flags(
            Command::new("warnings").about("Rule-based cash-flow alerts for the next 30 days"),
        ))
        .subcommand(
            Command::new("subscriptions")
                .about("Tracked subscriptions and detected recurring payments")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("track")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("cycle").long("cycle").help("monthly, weekly, ..."))
                        .arg(Arg::new("next").long("next").help("Next payment date YYYY-MM-DD"))
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .value_parser(clap::value_parser!(i64)),
                        )
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("notes").long("notes")),
                )
                .subcommand(Command::new("untrack").arg(id_arg())),
        )
        .subcommand(
            Command::new("goals")
                .about("Savings goals funded by priority")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("list")))
                .subcommand(goal_fields(Command::new("add"), true))
                .subcommand(goal_fields(Command::new("update").arg(id_arg()), false))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Category budgets")
                .subcommand_required(true)
                .subcommand(budget_fields(Command::new("add")))
                .subcommand(budget_fields(Command::new("update").arg(id_arg())))
                .subcommand(Command::new("rm").arg(id_arg()))
                .subcommand(json_flags(Command::new("active"))),
        )
        .subcommand(
            Command::new("installments")
                .about("Installment payments")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("pay").arg(id_arg()).arg(
                        Arg::new("unpaid")
                            .long("unpaid")
                            .action(ArgAction::SetTrue)
                            .help("Mark as not paid"),
                    ),
                )
                .subcommand(json_flags(
                    Command::new("batch").arg(
                        Arg::new("path")
                            .long("path")
                            .required(true)
                            .help("JSON array of {id, paid, start_date, installment_payment, categories_id}"),
                    ),
                )),
        )
        .subcommand(
            Command::new("import")
                .about("Import data")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("transactions").arg(
                        Arg::new("path")
                            .long("path")
                            .required(true)
                            .help("CSV (date,amount,bank,category,description,ref_no) or JSON array"),
                    ),
                )),
        )
        .subcommand(
            Command::new("tx")
                .about("Bank statement transactions")
                .subcommand_required(true)
                .subcommand(transaction_fields(Command::new("update").arg(id_arg())))
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("settings")
                .about("Per-user settings")
                .subcommand_required(true)
                .subcommand(json_flags(Command::new("show")))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("income").long("income").help("Monthly income estimate"))
                        .arg(Arg::new("threshold").long("threshold").help("Balance warning threshold"))
                        .arg(Arg::new("currency").long("currency"))
                        .arg(Arg::new("timezone").long("timezone"))
                        .arg(
                            Arg::new("anomalies")
                                .long("anomalies")
                                .value_parser(clap::value_parser!(bool))
                                .help("Enable anomaly detection (true/false)"),
                        )
                        .arg(Arg::new("sensitivity").long("sensitivity").help("1 to 10")),
                )
                .subcommand(
                    Command::new("recalc-income")
                        .about("Re-derive the income estimate from the last six months"),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Earning and spending reports")
                .subcommand_required(true)
                .subcommand(json_flags(
                    Command::new("earnings").about("Last month's earnings against the month before"),
                ))
                .subcommand(json_flags(
                    Command::new("monthly")
                        .about("Spending per month (default: the last twelve full months)")
                        .arg(Arg::new("start").long("start").requires("end").help("YYYY-MM-DD"))
                        .arg(Arg::new("end").long("end").requires("start").help("YYYY-MM-DD")),
                ))
                .subcommand(json_flags(window_args(
                    Command::new("categories").about("Spending per category"),
                )))
                .subcommand(json_flags(window_args(
                    Command::new("range").about("Earnings in a date range"),
                ))),
        )
        .subcommand(json_flags(
            Command::new("anomalies")
                .about("Recent expenses far above their category average")
                .arg(Arg::new("sensitivity").long("sensitivity")),
        ))
}
