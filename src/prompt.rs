//! Interactive credential entry.

use color_eyre::{eyre::eyre, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, BufRead, Write};

/// Ask for the user name on stderr and read one line from stdin
pub fn read_username() -> Result<String> {
  let mut stderr = io::stderr();
  write!(stderr, "User: ")?;
  stderr.flush()?;

  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line)
}

/// Read a password without echoing it, printing `*` per character
pub fn read_password() -> Result<String> {
  let mut stderr = io::stderr();
  write!(stderr, "Password: ")?;
  stderr.flush()?;

  let result = {
    let _raw = RawModeGuard::enable()?;
    read_masked(&mut stderr, || match event::read()? {
      Event::Key(key) => Ok(Some(key)),
      _ => Ok(None),
    })
  };
  writeln!(stderr)?;
  result
}

/// Restores cooked mode on drop so an error cannot leave the terminal raw
struct RawModeGuard;

impl RawModeGuard {
  fn enable() -> Result<Self> {
    enable_raw_mode().map_err(|e| eyre!("Failed to read password from terminal: {}", e))?;
    Ok(Self)
  }
}

impl Drop for RawModeGuard {
  fn drop(&mut self) {
    let _ = disable_raw_mode();
  }
}

fn read_masked<W, F>(out: &mut W, mut next_key: F) -> Result<String>
where
  W: Write,
  F: FnMut() -> Result<Option<KeyEvent>>,
{
  let mut password = String::new();
  loop {
    let Some(key) = next_key()? else {
      continue;
    };
    if key.kind == KeyEventKind::Release {
      continue;
    }
    match key.code {
      KeyCode::Enter => return Ok(password),
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        return Err(eyre!("Password entry cancelled"));
      }
      KeyCode::Backspace => {
        if password.pop().is_some() {
          write!(out, "\u{8} \u{8}")?;
        }
      }
      KeyCode::Char(c) => {
        password.push(c);
        write!(out, "*")?;
      }
      _ => {}
    }
    out.flush()?;
  }
}
