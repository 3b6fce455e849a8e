use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use asc_client::{
    AscClient, AscClientTrait, AscError, Config, LoginOutcome, TwoFactorChallenge,
};
use clap::Parser;
use colored::Colorize;

const COMMANDS: &str = "commands: login, list teams, list apps, select app <id>, app codes, \
list iaps, select iap <id>, iap codes, exit";

#[derive(Parser)]
#[command(name = "asc-cli")]
#[command(about = "Interactive promo-code console for App Store Connect")]
#[command(version)]
struct Cli {
    /// Overrides the session/cookie storage directory
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Codes to request per generation command
    #[arg(long, default_value_t = 2)]
    quantity: u32,

    /// Also list apps that are not currently for sale
    #[arg(long, default_value_t = false)]
    include_unreleased: bool,
}

struct Session {
    client: AscClient,
    quantity: u32,
    include_unreleased: bool,
    selected_app: Option<String>,
    selected_iap: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::new();
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let mut session = Session {
        client: AscClient::new(config),
        quantity: cli.quantity.max(1),
        include_unreleased: cli.include_unreleased,
        selected_app: None,
        selected_iap: None,
    };

    println!("{COMMANDS}");
    loop {
        let command = prompt("\nwhat's next?")?;
        match command.as_str() {
            "login" => session.log_in().await?,
            "list teams" => session.list_teams().await,
            "list apps" => session.list_apps().await,
            "app codes" => session.app_codes().await,
            "list iaps" => session.list_iaps().await,
            "iap codes" => session.iap_codes().await,
            "help" => println!("{COMMANDS}"),
            "exit" => break,
            other => {
                if let Some(id) = other.strip_prefix("select app ") {
                    session.select_app(id.trim()).await;
                } else if let Some(id) = other.strip_prefix("select iap ") {
                    session.select_iap(id.trim()).await;
                } else {
                    println!("{}", "bad command".red());
                }
            }
        }
    }
    Ok(())
}

impl Session {
    async fn log_in(&mut self) -> Result<()> {
        let username = prompt("username:")?;
        let password = prompt("password:")?;

        match self.client.begin_login(&username, &password).await {
            Ok(LoginOutcome::Authenticated(info)) => {
                println!("{}", "Logged in".green());
                println!("{} team(s) available", info.teams.len());
                Ok(())
            }
            Ok(LoginOutcome::ChallengeIssued(challenge)) => {
                self.complete_challenge(challenge).await
            }
            Err(err) => {
                print_error(&err);
                Ok(())
            }
        }
    }

    async fn complete_challenge(&mut self, challenge: TwoFactorChallenge) -> Result<()> {
        println!("{}", "2FA needed".yellow());

        let mut code_phone_id: Option<i64> = None;
        if challenge.did_send_code {
            if challenge.via_trusted_device {
                println!("A code was sent to your trusted devices");
            } else if let Some(phone) = &challenge.resend_to {
                println!("A code was sent to {}", phone.number);
                code_phone_id = Some(phone.id);
            }
        }

        let must_pick = !challenge.did_send_code;
        let wants_other = if must_pick {
            true
        } else {
            prompt("Want to use another option? y/n")? == "y"
        };

        if wants_other {
            if challenge.phone_numbers.is_empty() {
                println!("{}", "No trusted phone numbers on file".red());
                return Ok(());
            }
            println!("Please select a phone number:");
            for phone in &challenge.phone_numbers {
                println!("{}: {}", phone.id, phone.number);
            }
            let choice = prompt("phone id:")?;
            let Ok(phone_id) = choice.parse::<i64>() else {
                println!("{}", "bad phone id".red());
                return Ok(());
            };
            if let Err(err) = self.client.resend_code(phone_id).await {
                print_error(&err);
                return Ok(());
            }
            println!("Code sent");
            code_phone_id = Some(phone_id);
        }

        let code = prompt("Enter code:")?;
        match self.client.submit_challenge_code(&code, code_phone_id).await {
            Ok(info) => {
                println!("{}", "Successfully logged in".green());
                println!("{} team(s) available", info.teams.len());
            }
            Err(err) => print_error(&err),
        }
        Ok(())
    }

    async fn list_teams(&self) {
        match self.client.teams().await {
            Ok(teams) if teams.is_empty() => println!("No teams"),
            Ok(teams) => {
                for team in teams {
                    println!("{}: {}", team.id, team.name);
                }
            }
            Err(err) => print_error(&err),
        }
    }

    async fn list_apps(&self) {
        let teams = match self.client.teams().await {
            Ok(teams) => teams,
            Err(err) => {
                print_error(&err);
                return;
            }
        };
        for team in teams {
            println!("{}", team.name.bold());
            match self
                .client
                .apps_for(team.id, self.include_unreleased)
                .await
            {
                Ok(apps) if apps.is_empty() => println!("  No apps"),
                Ok(apps) => {
                    for app in apps {
                        println!("  {}: {}, {}", app.id, app.name, app.platform);
                    }
                }
                Err(err) => print_error(&err),
            }
        }
    }

    async fn select_app(&mut self, app_id: &str) {
        if self.client.team_id_for_app(app_id).await.is_none() {
            println!("{}", "Unknown app id".red());
            return;
        }
        match self.client.promo_code_info(app_id).await {
            Ok(info) => {
                self.selected_app = Some(app_id.to_string());
                self.selected_iap = None;
                println!("Selected version {}", info.version);
                println!("Promo codes left: {}", info.codes_left);
            }
            Err(err) => print_error(&err),
        }
    }

    async fn app_codes(&self) {
        let Some(app_id) = &self.selected_app else {
            println!("Please select an app");
            return;
        };
        let info = match self.client.promo_code_info(app_id).await {
            Ok(info) => info,
            Err(err) => {
                print_error(&err);
                return;
            }
        };

        println!("requesting codes, may take a while");
        match self
            .client
            .request_app_codes(
                app_id,
                info.version_id,
                self.quantity,
                &info.contract_filename,
                None,
            )
            .await
        {
            Ok(codes) => print_codes(&codes),
            Err(err) => print_error(&err),
        }
    }

    async fn list_iaps(&self) {
        let Some(app_id) = &self.selected_app else {
            println!("Please select an app");
            return;
        };
        match self.client.iaps_for(app_id).await {
            Ok(iaps) if iaps.is_empty() => println!("No in-app purchases"),
            Ok(iaps) => {
                for iap in iaps {
                    println!("{}: {}, codes left: {}", iap.id, iap.name, iap.codes_left);
                }
            }
            Err(err) => print_error(&err),
        }
    }

    async fn select_iap(&mut self, iap_id: &str) {
        if self.selected_app.is_none() {
            println!("Please select an app");
            return;
        }
        if iap_id.is_empty() {
            println!("{}", "bad iap id".red());
            return;
        }
        self.selected_iap = Some(iap_id.to_string());
        println!("Selected");
    }

    async fn iap_codes(&self) {
        let (Some(app_id), Some(iap_id)) = (&self.selected_app, &self.selected_iap) else {
            println!("Please select an app and its IAP");
            return;
        };

        println!("requesting codes, may take a while");
        match self
            .client
            .request_iap_codes(app_id, iap_id, self.quantity, None)
            .await
        {
            Ok(codes) => print_codes(&codes),
            Err(err) => print_error(&err),
        }
    }
}

fn print_codes(codes: &[asc_core::PromoCode]) {
    println!("{}", format!("{} code(s):", codes.len()).green());
    for code in codes {
        match code.expiration_date {
            Some(expires) => println!("{}  (expires {})", code.code, expires.format("%Y-%m-%d")),
            None => println!("{}", code.code),
        }
    }
}

fn print_error(err: &AscError) {
    println!("{}: {err}", err.title().red());
}

fn prompt(label: &str) -> Result<String> {
    println!("{label}");
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
