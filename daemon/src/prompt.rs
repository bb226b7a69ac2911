//! Interactive console prompts: signature approval and keystore password.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use ratings_wallet_core::ApprovalGate;

/// Environment variable consulted before prompting for a password.
pub const PASSWORD_ENV: &str = "RATINGS_WALLET_PASSWORD";

/// Print `prompt` to stderr and read one line from stdin.
///
/// End of input reads as an empty line.
pub fn read_line(prompt: &str) -> io::Result<String> {
    let mut stderr = io::stderr().lock();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Asks on the console before every signature. Anything but `y`/`yes`,
/// including end of input, declines.
pub struct ConsoleApproval;

#[async_trait]
impl ApprovalGate for ConsoleApproval {
    async fn approve(&self, message: &str) -> bool {
        let prompt = format!("Sign the message \"{message}\"? [y/N] ");
        match tokio::task::spawn_blocking(move || read_line(&prompt)).await {
            Ok(Ok(answer)) => is_affirmative(&answer),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "could not read approval, declining");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "approval prompt aborted, declining");
                false
            }
        }
    }
}

/// The keystore password from [`PASSWORD_ENV`], or asked for on the
/// console. With `confirm`, a prompted password must be typed twice.
pub fn wallet_password(confirm: bool) -> anyhow::Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        anyhow::ensure!(!password.is_empty(), "{PASSWORD_ENV} is set but empty");
        return Ok(password);
    }
    let password = read_line("Wallet password: ")?;
    anyhow::ensure!(!password.is_empty(), "a wallet password is required");
    if confirm {
        let again = read_line("Repeat password: ")?;
        anyhow::ensure!(again == password, "passwords do not match");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_yes_approves() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES \n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }
}
