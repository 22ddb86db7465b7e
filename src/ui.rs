// UI layer: a numbered menu read line by line with `dialoguer`. Input is
// collected here, handed to the `ApiClient`, and the outcome or error is
// printed. Only prompt I/O and chart writing can end the loop early.

use crate::api::{ApiClient, Outcome};
use crate::chart;
use crate::config::ClientConfig;
use crate::error::{CommandError, CommandResult};
use crate::models::{CategoryRecord, LoginRequest, SignUpRequest};
use crate::session::Session;
use crate::transport::Transport;
use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::{self, Write as _};
use std::time::Duration;
use tracing::debug;

/// The closed set of menu commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    Exit,
    SignUp,
    LogIn,
    FetchUserData,
    FetchAlerts,
    AddExpense,
}

impl MenuCommand {
    /// Map a line of input to a command. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "0" => Some(Self::Exit),
            "1" => Some(Self::SignUp),
            "2" => Some(Self::LogIn),
            "3" => Some(Self::FetchUserData),
            "4" => Some(Self::FetchAlerts),
            "5" => Some(Self::AddExpense),
            _ => None,
        }
    }

    fn requires_token(self) -> bool {
        matches!(
            self,
            Self::FetchUserData | Self::FetchAlerts | Self::AddExpense
        )
    }
}

const MENU: &str = "\n>> Choose a command:
   0 => Exit
   1 => Sign Up
   2 => Log In
   3 => Fetch User Data
   4 => Fetch Alerts
   5 => Add Expense";

/// Main interactive loop. Runs until the operator picks 0.
pub fn main_menu<T: Transport>(
    api: &ApiClient<T>,
    session: &mut Session,
    config: &ClientConfig,
) -> Result<()> {
    loop {
        println!("{MENU}");
        let choice: String = Input::new()
            .with_prompt("Enter your choice")
            .allow_empty(true)
            .interact_text()?;

        let Some(cmd) = MenuCommand::parse(&choice) else {
            println!("\n** Invalid command, please try again.");
            continue;
        };
        debug!(?cmd, "dispatching");

        if cmd.requires_token() {
            if let Err(err) = session.require_token() {
                report(cmd, &err);
                continue;
            }
        }

        let result = match cmd {
            MenuCommand::Exit => {
                println!("\nExiting Budget Tracker Client. Goodbye!");
                return Ok(());
            }
            MenuCommand::SignUp => handle_sign_up(api, session)?,
            MenuCommand::LogIn => handle_log_in(api, session)?,
            MenuCommand::FetchUserData => {
                with_spinner("Fetching user data...", || api.fetch_user_data(session))
            }
            MenuCommand::FetchAlerts => {
                with_spinner("Loading notifications...", || api.fetch_alerts(session))
            }
            MenuCommand::AddExpense => handle_add_expense(api, session)?,
        };

        match result {
            Ok(outcome) => {
                print!("{}", render_outcome(&outcome));
                if let Outcome::UserData(records) = &outcome {
                    offer_chart(records, config)?;
                }
            }
            Err(err) => report(cmd, &err),
        }
    }
}

fn handle_sign_up<T: Transport>(
    api: &ApiClient<T>,
    session: &Session,
) -> Result<CommandResult<Outcome>> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let email: String = Input::new().with_prompt("Email").interact_text()?;
    let password: String = Password::new().with_prompt("Password").interact()?;
    let req = SignUpRequest {
        username: username.trim().to_string(),
        email: email.trim().to_string(),
        password,
    };
    Ok(with_spinner("Signing up...", || api.sign_up(session, &req)))
}

fn handle_log_in<T: Transport>(
    api: &ApiClient<T>,
    session: &mut Session,
) -> Result<CommandResult<Outcome>> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let password: String = Password::new().with_prompt("Password").interact()?;
    let req = LoginRequest {
        username: username.trim().to_string(),
        password,
    };
    Ok(with_spinner("Logging in...", || api.log_in(session, &req)))
}

fn handle_add_expense<T: Transport>(
    api: &ApiClient<T>,
    session: &Session,
) -> Result<CommandResult<Outcome>> {
    let description: String = Input::new().with_prompt("Description").interact_text()?;
    // `Input<f64>` re-prompts until the text parses as a number.
    let amount: f64 = Input::new()
        .with_prompt("Amount")
        .validate_with(|v: &f64| {
            if v.is_finite() && *v > 0.0 {
                Ok(())
            } else {
                Err("amount must be a positive number")
            }
        })
        .interact_text()?;
    Ok(with_spinner("Adding expense...", || {
        api.add_expense(session, description.trim(), amount)
    }))
}

fn offer_chart(records: &[CategoryRecord], config: &ClientConfig) -> Result<()> {
    let wanted = Confirm::new()
        .with_prompt("Save a budget vs. spending chart?")
        .default(true)
        .interact()?;
    if wanted {
        chart::render(records, &config.chart_file)?;
        println!("Chart saved to {}", config.chart_file.display());
    }
    Ok(())
}

/// Show a spinner for the duration of `f`.
fn with_spinner<R>(message: &'static str, f: impl FnOnce() -> R) -> R {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    let out = f();
    spinner.finish_and_clear();
    out
}

/// Human-readable text for a successful command.
pub fn render_outcome(outcome: &Outcome) -> String {
    let mut out = String::new();
    match write_outcome(&mut out, outcome) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

fn write_outcome(out: &mut String, outcome: &Outcome) -> fmt::Result {
    match outcome {
        Outcome::SignedUp { response } => {
            writeln!(out, "Response Body: {response}")?;
            writeln!(out, "\nSign-up successful! Please log in to continue.")?;
        }
        Outcome::LoggedIn { config_file } => {
            writeln!(out, "\nLog-in successful! Your session token has been stored.")?;
            writeln!(out, "Token saved to {}", config_file.display())?;
        }
        Outcome::UserData(records) => {
            writeln!(out, "\nUser Data:")?;
            for r in records {
                writeln!(
                    out,
                    "- {}: Spent {}, Budget {}",
                    r.category_name, r.total_amount, r.budget_amount
                )?;
            }
        }
        Outcome::NoUserData(message) => {
            writeln!(out, "\n{message}")?;
        }
        Outcome::Notifications(items) => {
            writeln!(out, "\nNotifications:")?;
            for n in items {
                writeln!(out, "- {} (Created at: {})", n.message, n.created_at)?;
            }
        }
        Outcome::NoNotifications => {
            writeln!(out, "\nNo notifications available.")?;
        }
        Outcome::ExpenseAdded { category } => {
            writeln!(out, "\nExpense added under category: {category}")?;
        }
    }
    Ok(())
}

/// Human-readable text for a failed command.
pub fn render_error(cmd: MenuCommand, err: &CommandError) -> String {
    let action = match cmd {
        MenuCommand::SignUp => "Sign-up",
        MenuCommand::LogIn => "Log-in",
        MenuCommand::FetchUserData => "Fetching user data",
        MenuCommand::FetchAlerts => "Fetching notifications",
        MenuCommand::AddExpense => "Adding expense",
        MenuCommand::Exit => "Exit",
    };
    match err {
        CommandError::NotAuthenticated => "You must log in first!".to_string(),
        CommandError::Transport => {
            format!("\n{action} failed: could not contact server. Please try again.")
        }
        other => format!("\n{action} failed: {other}"),
    }
}

fn report(cmd: MenuCommand, err: &CommandError) {
    println!("{}", render_error(cmd, err));
}
