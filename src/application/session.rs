use std::io::{BufRead, Write};
use std::ops::ControlFlow;
use std::str::FromStr;

use tracing::debug;

use crate::domain::{
    format_cents, parse_amount, Cents, Ledger, LedgerError, TransactionKind, TransactionRecord,
};

use super::{AppError, MenuChoiceError};

/// Entries of the main menu, numbered as shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Deposit,
    Withdraw,
    ViewBalance,
    ViewLast,
    UndoLast,
    Exit,
    Statement,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 7] = [
        MenuChoice::Deposit,
        MenuChoice::Withdraw,
        MenuChoice::ViewBalance,
        MenuChoice::ViewLast,
        MenuChoice::UndoLast,
        MenuChoice::Exit,
        MenuChoice::Statement,
    ];

    pub fn number(&self) -> i64 {
        match self {
            MenuChoice::Deposit => 1,
            MenuChoice::Withdraw => 2,
            MenuChoice::ViewBalance => 3,
            MenuChoice::ViewLast => 4,
            MenuChoice::UndoLast => 5,
            MenuChoice::Exit => 6,
            MenuChoice::Statement => 7,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::Deposit => "Deposit",
            MenuChoice::Withdraw => "Withdraw",
            MenuChoice::ViewBalance => "View Balance",
            MenuChoice::ViewLast => "View Last Transaction",
            MenuChoice::UndoLast => "Undo Last Transaction",
            MenuChoice::Exit => "Exit",
            MenuChoice::Statement => "View Statement",
        }
    }
}

impl FromStr for MenuChoice {
    type Err = MenuChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let number: i64 = s
            .parse()
            .map_err(|_| MenuChoiceError::NotANumber(s.to_string()))?;
        MenuChoice::ALL
            .into_iter()
            .find(|choice| choice.number() == number)
            .ok_or(MenuChoiceError::OutOfRange(number))
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user picked "Exit"
    Exit,
    /// Input ran out before the user picked "Exit"
    EndOfInput,
}

/// An interactive menu session over one ledger.
///
/// The ledger is borrowed: the caller owns it and decides what happens to it
/// once the session ends.
pub struct Session<'a, R, W> {
    ledger: &'a mut Ledger,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(ledger: &'a mut Ledger, input: R, output: W) -> Self {
        Self {
            ledger,
            input,
            output,
        }
    }

    /// Run the menu until the user exits or input is exhausted.
    pub fn run(&mut self) -> Result<SessionEnd, AppError> {
        writeln!(
            self.output,
            "Welcome! Your initial balance is ${}",
            format_cents(self.ledger.current_balance())
        )?;

        loop {
            self.print_menu()?;
            let Some(line) = self.read_line()? else {
                writeln!(self.output)?;
                return Ok(SessionEnd::EndOfInput);
            };

            let choice = match line.parse::<MenuChoice>() {
                Ok(choice) => choice,
                Err(MenuChoiceError::NotANumber(_)) => {
                    writeln!(self.output, "Invalid input. Please enter a number.")?;
                    continue;
                }
                Err(MenuChoiceError::OutOfRange(_)) => {
                    writeln!(
                        self.output,
                        "Invalid choice. Please select from 1 to {}.",
                        MenuChoice::ALL.len()
                    )?;
                    continue;
                }
            };
            debug!(?choice, "menu choice");

            if let ControlFlow::Break(end) = self.handle(choice)? {
                return Ok(end);
            }
        }
    }

    /// Carry out one menu choice.
    pub fn handle(&mut self, choice: MenuChoice) -> Result<ControlFlow<SessionEnd>, AppError> {
        match choice {
            MenuChoice::Deposit | MenuChoice::Withdraw => {
                let kind = if choice == MenuChoice::Deposit {
                    TransactionKind::Deposit
                } else {
                    TransactionKind::Withdrawal
                };
                let Some(amount) = self.prompt_amount(kind)? else {
                    return Ok(ControlFlow::Break(SessionEnd::EndOfInput));
                };
                if let Some(amount) = amount {
                    self.apply(kind, amount)?;
                }
            }
            MenuChoice::ViewBalance => {
                writeln!(
                    self.output,
                    "Current Balance: ${}",
                    format_cents(self.ledger.current_balance())
                )?;
            }
            MenuChoice::ViewLast => match self.ledger.view_last() {
                Some(record) => writeln!(
                    self.output,
                    "Last Transaction: {} of ${}",
                    record.kind(),
                    format_cents(record.amount_cents())
                )?,
                None => writeln!(self.output, "No transactions in history.")?,
            },
            MenuChoice::UndoLast => match self.ledger.undo_last() {
                Ok(undone) => {
                    writeln!(
                        self.output,
                        "UNDO: Reversed {} of ${}.",
                        undone.record.kind().as_str(),
                        format_cents(undone.record.amount_cents())
                    )?;
                    writeln!(self.output, "New Balance: ${}", format_cents(undone.balance))?;
                }
                Err(LedgerError::EmptyHistory) => {
                    writeln!(self.output, "No transactions to undo.")?;
                }
                Err(err) => return Err(err.into()),
            },
            MenuChoice::Statement => self.print_statement()?,
            MenuChoice::Exit => return Ok(ControlFlow::Break(SessionEnd::Exit)),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn apply(&mut self, kind: TransactionKind, amount: Cents) -> Result<(), AppError> {
        let result = match kind {
            TransactionKind::Deposit => self.ledger.deposit(amount),
            TransactionKind::Withdrawal => self.ledger.withdraw(amount),
        };

        match result {
            Ok(balance) => {
                let verb = match kind {
                    TransactionKind::Deposit => "deposited",
                    TransactionKind::Withdrawal => "withdrew",
                };
                writeln!(
                    self.output,
                    "Successfully {} ${}.",
                    verb,
                    format_cents(amount)
                )?;
                writeln!(self.output, "New Balance: ${}", format_cents(balance))?;
            }
            Err(LedgerError::InvalidAmount { kind, .. }) => {
                writeln!(
                    self.output,
                    "Invalid Amount: {} must be greater than zero.",
                    kind
                )?;
            }
            Err(LedgerError::InsufficientFunds { balance, requested }) => {
                writeln!(
                    self.output,
                    "Insufficient Funds: Cannot withdraw ${}. Current balance is ${}.",
                    format_cents(requested),
                    format_cents(balance)
                )?;
            }
            Err(err) => {
                writeln!(self.output, "Error: {}. Transaction not recorded.", err)?;
            }
        }
        Ok(())
    }

    /// Ask for an amount. The outer `None` means input ended; the inner
    /// `None` means the line was not a valid amount and was reported.
    fn prompt_amount(&mut self, kind: TransactionKind) -> Result<Option<Option<Cents>>, AppError> {
        write!(self.output, "Enter {} amount: ", kind.as_str())?;
        self.output.flush()?;

        let Some(line) = self.read_line()? else {
            writeln!(self.output)?;
            return Ok(None);
        };
        match parse_amount(&line) {
            Ok(0) if line.bytes().any(|b| matches!(b, b'1'..=b'9')) => {
                writeln!(
                    self.output,
                    "Note: amounts are rounded to the nearest cent; '{}' rounds to $0.00.",
                    line.trim()
                )?;
                Ok(Some(Some(0)))
            }
            Ok(amount) => Ok(Some(Some(amount))),
            Err(err) => {
                writeln!(self.output, "Invalid input: {}.", err)?;
                Ok(Some(None))
            }
        }
    }

    fn print_statement(&mut self) -> Result<(), AppError> {
        writeln!(
            self.output,
            "Opening Balance: ${}",
            format_cents(self.ledger.opening_balance())
        )?;
        if self.ledger.history().is_empty() {
            writeln!(self.output, "No transactions in history.")?;
        } else {
            writeln!(self.output, "{:>5} {:<12} {:>14}  RECORDED", "#", "TYPE", "AMOUNT")?;
            writeln!(self.output, "{}", "-".repeat(56))?;
            for record in self.ledger.history() {
                writeln!(self.output, "{}", statement_line(record))?;
            }
            writeln!(self.output, "{}", "-".repeat(56))?;
        }
        writeln!(
            self.output,
            "Current Balance: ${}",
            format_cents(self.ledger.current_balance())
        )?;
        Ok(())
    }

    fn print_menu(&mut self) -> Result<(), AppError> {
        writeln!(self.output)?;
        writeln!(self.output, "--- Simple Banking System ---")?;
        for choice in MenuChoice::ALL {
            writeln!(self.output, "{}. {}", choice.number(), choice.label())?;
        }
        writeln!(self.output, "{}", "-".repeat(30))?;
        write!(self.output, "Enter your choice: ")?;
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, AppError> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

fn statement_line(record: &TransactionRecord) -> String {
    format!(
        "{:>5} {:<12} {:>14}  {}",
        record.sequence(),
        record.kind().to_string(),
        format!("${}", format_cents(record.amount_cents())),
        record.recorded_at().format("%Y-%m-%d %H:%M:%S")
    )
}

/// Parse an opening balance typed on the command line and open the ledger.
pub fn open_ledger(opening_balance: &str) -> Result<Ledger, AppError> {
    let cents = parse_amount(opening_balance)?;
    Ok(Ledger::new(cents)?)
}
