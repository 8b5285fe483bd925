use clap::Subcommand;

use crate::commands::print_json;
use crate::context::{AppContext, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Create an account
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in with e-mail and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Send a password-reset e-mail
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    /// Change the password of the logged-in account
    UpdatePassword {
        #[arg(long)]
        password: String,
    },
    /// Show who is logged in
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(action: AuthAction) -> CmdResult {
    let mut ctx = AppContext::connect().await?;
    let result = dispatch(&mut ctx, action).await;
    ctx.persist().await;
    result
}

async fn dispatch(ctx: &mut AppContext, action: AuthAction) -> CmdResult {
    match action {
        AuthAction::Signup { email, password } => {
            match ctx.session.sign_up(&email, &password).await? {
                Some(_) => println!("Account created for {email}"),
                None => println!("Account created. Check {email} to confirm your address."),
            }
        }
        AuthAction::Login { email, password } => {
            let identity = ctx.session.login(&email, &password).await?;
            println!("Logged in as {}", identity.email.as_deref().unwrap_or(&identity.id));
        }
        AuthAction::Logout => {
            ctx.session.logout().await?;
            println!("Logged out");
        }
        AuthAction::ResetPassword { email } => {
            ctx.session.reset_password(&email).await?;
            println!("Password reset e-mail sent to {email}");
        }
        AuthAction::UpdatePassword { password } => {
            ctx.session.update_password(&password).await?;
            println!("Password updated");
        }
        AuthAction::Status { json } => status(ctx, json)?,
    }
    Ok(())
}

fn status(ctx: &AppContext, json: bool) -> CmdResult {
    let identity = ctx.session.identity();
    if json {
        print_json(&serde_json::json!({
            "authenticated": identity.is_some(),
            "user": identity,
        }))?;
        return Ok(());
    }

    match identity {
        Some(identity) => println!(
            "authenticated as {} ({})",
            identity.email.as_deref().unwrap_or("no e-mail"),
            identity.id
        ),
        None => {
            if let Some(message) = ctx.session.last_error() {
                println!("not authenticated: {message}");
            } else {
                println!("not authenticated");
            }
        }
    }
    Ok(())
}
