use anyhow::Result;
use log::{debug, error, info};
use std::io::{self, BufRead, Write};

use crate::account::{self, NewAccount, TransactionType};
use crate::cli::utils::Console;
use crate::context::BankContext;
use crate::database::models::AccountType;
use crate::error::BankError;
use crate::security::{self, pin::PIN_LENGTH, LoginAttempts};

/// Tries allowed when choosing a new PIN before one is generated instead
const MAX_PIN_ENTRY_TRIES: u32 = 3;

/// Where the session stands between menu actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { username: String },
}

/// Entries of the numbered main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Login,
    CreateAccount,
    DeleteAccount,
    Deposit,
    Withdraw,
    Statistics,
    Logout,
    Quit,
}

impl MenuAction {
    pub const ALL: [MenuAction; 8] = [
        MenuAction::Login,
        MenuAction::CreateAccount,
        MenuAction::DeleteAccount,
        MenuAction::Deposit,
        MenuAction::Withdraw,
        MenuAction::Statistics,
        MenuAction::Logout,
        MenuAction::Quit,
    ];

    pub fn key(&self) -> &str {
        match self {
            MenuAction::Login => "1",
            MenuAction::CreateAccount => "2",
            MenuAction::DeleteAccount => "3",
            MenuAction::Deposit => "4",
            MenuAction::Withdraw => "5",
            MenuAction::Statistics => "6",
            MenuAction::Logout => "7",
            MenuAction::Quit => "8",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MenuAction::Login => "Log In",
            MenuAction::CreateAccount => "Create Account",
            MenuAction::DeleteAccount => "Delete Account",
            MenuAction::Deposit => "Deposit",
            MenuAction::Withdraw => "Withdraw",
            MenuAction::Statistics => "View Statistics",
            MenuAction::Logout => "Log Out",
            MenuAction::Quit => "Quit",
        }
    }

    pub fn from_choice(choice: &str) -> Option<Self> {
        let choice = choice.trim();
        Self::ALL.into_iter().find(|action| action.key() == choice)
    }
}

/// The menu loop. Owns the bank context for the length of the session.
pub struct SessionController<R, W> {
    ctx: BankContext,
    console: Console<R, W>,
    state: SessionState,
    attempts: LoginAttempts,
    app_name: String,
}

impl<R: BufRead, W: Write> SessionController<R, W> {
    pub fn new(ctx: BankContext, console: Console<R, W>, app_name: &str) -> Self {
        let attempts = LoginAttempts::new(ctx.max_failed_attempts());
        Self {
            ctx,
            console,
            state: SessionState::LoggedOut,
            attempts,
            app_name: app_name.to_string(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn context(&self) -> &BankContext {
        &self.ctx
    }

    pub fn console(&self) -> &Console<R, W> {
        &self.console
    }

    /// Run until the user quits or the input ends.
    ///
    /// Bank errors are reported and the loop continues; console failures end it.
    pub fn run(&mut self) -> Result<()> {
        let welcome = format!("Welcome to {}!", self.app_name);
        self.console.print_info(&welcome)?;

        loop {
            self.show_menu()?;

            let choice = match self.console.read_line("Enter your choice: ") {
                Ok(choice) => choice,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            let Some(action) = MenuAction::from_choice(&choice) else {
                self.console.print_error("Invalid choice. Please try again.")?;
                continue;
            };

            if action == MenuAction::Quit {
                break;
            }

            if let Err(err) = self.dispatch(action) {
                if is_end_of_input(&err) {
                    break;
                }
                match err.downcast::<BankError>() {
                    Ok(bank_err) => self.report(&bank_err)?,
                    Err(other) => return Err(other),
                }
            }
        }

        if let SessionState::LoggedIn { username } = &self.state {
            info!("Logging out {} at exit", username);
            self.state = SessionState::LoggedOut;
        }
        self.console.print_info("Goodbye!")?;
        Ok(())
    }

    fn show_menu(&mut self) -> io::Result<()> {
        let title = self.app_name.clone();
        self.console.print_header(&title)?;

        if let SessionState::LoggedIn { username } = &self.state {
            let banner = format!("Logged in as {}", username);
            self.console.print_info(&banner)?;
        }

        for action in MenuAction::ALL {
            let line = format!("[{}] {}", action.key(), action.label());
            self.console.print_info(&line)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, action: MenuAction) -> Result<()> {
        debug!("Menu action {:?} in state {:?}", action, self.state);
        match action {
            MenuAction::Login => self.login(),
            MenuAction::CreateAccount => self.create_account(),
            MenuAction::DeleteAccount => self.delete_account(),
            MenuAction::Deposit => self.transact(TransactionType::Deposit),
            MenuAction::Withdraw => self.transact(TransactionType::Withdrawal),
            MenuAction::Statistics => self.show_statistics(),
            MenuAction::Logout => self.logout(),
            MenuAction::Quit => Ok(()),
        }
    }

    fn report(&mut self, err: &BankError) -> io::Result<()> {
        if err.is_storage() {
            error!("Action aborted: {}", err);
            self.console.print_error(&format!("{}. The action was aborted.", err))
        } else {
            debug!("Action rejected: {}", err);
            self.console.print_error(&err.to_string())
        }
    }

    fn require_login(&self) -> Result<String, BankError> {
        match &self.state {
            SessionState::LoggedIn { username } => Ok(username.clone()),
            SessionState::LoggedOut => Err(BankError::authentication("Please log in first.")),
        }
    }

    fn login(&mut self) -> Result<()> {
        if let SessionState::LoggedIn { username } = &self.state {
            let message = format!("Already logged in as {}. Log out first.", username);
            self.console.print_info(&message)?;
            return Ok(());
        }

        self.console.print_header("Log In")?;
        let username = self.console.read_line("Enter your username: ")?;

        if self.ctx.store().get(&username).map_err(BankError::from)?.is_none() {
            return Err(BankError::authentication("No such user exists.").into());
        }

        let prompt = format!("Enter your {}-digit PIN or 0 to cancel: ", PIN_LENGTH);
        loop {
            let pin_input = self.console.read_line(&prompt)?;
            if pin_input == "0" {
                self.console.print_info("Login cancelled.")?;
                return Ok(());
            }

            match security::authenticate(&mut self.ctx, &mut self.attempts, &username, &pin_input) {
                Ok(account) => {
                    self.console.print_success(&format!("Welcome {}", account.name))?;
                    self.console.print_info(&format!(
                        "{} balance: ${:.2}",
                        account.account_type.label(),
                        account.balance
                    ))?;
                    self.state = SessionState::LoggedIn { username };
                    return Ok(());
                }
                Err(BankError::Authentication(message)) => {
                    self.console.print_error(&message)?;
                    if self.attempts.is_exhausted(&username) {
                        return self.offer_pin_reset(&username);
                    }
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    fn offer_pin_reset(&mut self, username: &str) -> Result<()> {
        self.console
            .print_warning("You have exceeded the maximum number of PIN attempts.")?;
        self.attempts.reset(username);

        if !self.console.confirm("Would you like to reset your PIN? (yes/no): ")? {
            self.console.print_info("PIN not reset. Returning to menu.")?;
            return Ok(());
        }

        let new_pin = self.prompt_new_pin()?;
        account::reset_pin(&mut self.ctx, username, &new_pin)?;
        self.console
            .print_success("Your PIN has been reset. Please log in again to continue.")?;
        Ok(())
    }

    /// Ask for a new PIN, offering a generated one; after repeated bad input a PIN is assigned
    fn prompt_new_pin(&mut self) -> Result<String> {
        let prompt = format!(
            "Enter a {}-digit PIN or type 'random' to generate one: ",
            PIN_LENGTH
        );

        for _ in 0..MAX_PIN_ENTRY_TRIES {
            let input = self.console.read_line(&prompt)?;

            if input.eq_ignore_ascii_case("random") {
                let generated = security::generate_pin();
                self.console
                    .print_info(&format!("Your generated PIN is: {}", generated))?;
                return Ok(generated);
            }

            match security::validate_pin(&input) {
                Ok(()) => return Ok(input),
                Err(e) => self.console.print_error(&e.to_string())?,
            }
        }

        let fallback = security::generate_pin();
        self.console
            .print_warning(&format!("Failed to create PIN. Your new PIN is: {}", fallback))?;
        Ok(fallback)
    }

    fn prompt_account_type(&mut self) -> Result<AccountType> {
        let input = self
            .console
            .read_line("Enter C or S for Checking or Savings: ")?;
        let account_type = AccountType::from_str(&input).map_err(BankError::Validation)?;
        Ok(account_type)
    }

    fn create_account(&mut self) -> Result<()> {
        self.console.print_header("Create Account")?;

        let username = self.console.read_line("Enter new username: ")?;
        account::management::validate_username(&username)?;
        if self.ctx.store().get(&username).map_err(BankError::from)?.is_some() {
            return Err(BankError::validation("Username already exists.").into());
        }

        let pin = self.prompt_new_pin()?;
        let name = self.console.read_line("Enter your name: ")?;
        let account_type = self.prompt_account_type()?;

        let account = account::create_account(
            &mut self.ctx,
            NewAccount {
                username,
                name,
                pin,
                account_type,
            },
        )?;

        self.console.print_success(&format!(
            "{} account created for {}.",
            account.account_type.label(),
            account.username
        ))?;
        Ok(())
    }

    fn delete_account(&mut self) -> Result<()> {
        let username = self.require_login()?;

        let prompt = format!("Type 'yes' to permanently delete account '{}': ", username);
        if !self.console.confirm(&prompt)? {
            self.console.print_info("Deletion cancelled.")?;
            return Ok(());
        }

        let result = account::delete_account(&mut self.ctx, &username);
        if result.is_err() && matches!(self.ctx.store().get(&username), Ok(None)) {
            // the row is gone even though the delete reported a failure
            info!("Account {} removed, logging out", username);
            self.state = SessionState::LoggedOut;
        }
        result?;
        self.state = SessionState::LoggedOut;

        self.console.print_success("Account deleted successfully.")?;
        Ok(())
    }

    fn transact(&mut self, transaction_type: TransactionType) -> Result<()> {
        let username = self.require_login()?;
        let current = account::get_account(&self.ctx, &username)?;

        self.console.print_info(&format!(
            "{} balance: ${:.2}",
            current.account_type.label(),
            current.balance
        ))?;

        let verb = match transaction_type {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdraw",
        };
        let input = self
            .console
            .read_line(&format!("Enter amount to {}: $", verb))?;
        let amount = account::parse_amount(&input)?;

        let updated = account::process_transaction(&mut self.ctx, &username, transaction_type, amount)?;
        self.console.print_success(&format!(
            "Transaction complete. New balance is ${:.2}",
            updated.balance
        ))?;
        Ok(())
    }

    fn show_statistics(&mut self) -> Result<()> {
        let report = account::report(self.ctx.store()).map_err(BankError::from)?;

        self.console.print_header("Statistics")?;
        if report.is_empty() {
            self.console.print_info("No accounts available.")?;
            return Ok(());
        }

        for partition in &report.partitions {
            let label = partition.account_type.label();
            self.console.print_info(&format!(
                "Average {} balance: ${:.2} across {} account(s)",
                label,
                partition.mean.round_dp(2),
                partition.count
            ))?;

            let above = if partition.above_average.is_empty() {
                "None".to_string()
            } else {
                partition.above_average.join(", ")
            };
            self.console
                .print_info(&format!("Users above average ({}): {}", label, above))?;
        }
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SessionState::LoggedOut) {
            SessionState::LoggedIn { username } => {
                info!("User {} logged out", username);
                self.console.print_success("Logged out.")?;
            }
            SessionState::LoggedOut => {
                self.console.print_info("You are not logged in.")?;
            }
        }
        Ok(())
    }
}

fn is_end_of_input(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .map_or(false, |e| e.kind() == io::ErrorKind::UnexpectedEof)
}
