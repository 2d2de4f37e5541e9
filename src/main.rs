use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

use recicla::api::types::{CollectionRequest, RequestStatus};
use recicla::{logging, Config, Session};

#[derive(Parser, Debug)]
#[command(name = "recicla")]
#[command(about = "Command-line client for the recycling collection marketplace")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/recicla/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write logs to this file instead of stderr
  #[arg(long)]
  log_file: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List collection requests, most urgent first
  Requests {
    /// Only show requests with this status
    #[arg(long)]
    status: Option<RequestStatus>,
  },
  /// Show one collection request in full
  Request {
    id: u64,
    /// Skip the cache and fetch the latest state
    #[arg(long)]
    refresh: bool,
  },
  /// Look up a user's contact phone number
  Phone { user_id: u64 },
  /// Move a collection request to a new status
  Transition { id: u64, status: RequestStatus },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _guard = logging::init(args.log_file.as_deref())?;

  let config = Config::load(args.config.as_deref())?;
  let session = Session::new(&config)?;

  match args.command {
    Command::Requests { status } => {
      let mut requests = session.list_requests().await?;
      if let Some(filter) = status {
        requests.retain(|r| r.status == filter);
      }
      print_request_list(&requests);
    }
    Command::Request { id, refresh } => {
      let request = if refresh {
        session.request_refreshed(id).await?
      } else {
        session.request(id).await?
      };
      print_request(&request);
    }
    Command::Phone { user_id } => match session.contact_phone(user_id).await? {
      Some(phone) => println!("{}", phone.number),
      None => println!("No number on file for user #{}", user_id),
    },
    Command::Transition { id, status } => {
      let updated = session.transition_request(id, status).await?;
      println!("Request #{} is now {}", updated.id, updated.status);
    }
  }

  Ok(())
}

fn print_request_list(requests: &[CollectionRequest]) {
  if requests.is_empty() {
    println!("No collection requests found.");
    return;
  }

  println!(
    "{:<6} {:<10} {:<20} {:>8} {:<20} {}",
    "ID", "STATUS", "MATERIAL", "KG", "CLIENT", "CREATED"
  );
  for request in requests {
    println!(
      "{:<6} {:<10} {:<20} {:>8.1} {:<20} {}",
      request.id,
      request.status,
      truncate(&request.material, 20),
      request.weight_kg,
      truncate(&request.client_name, 20),
      request.created_at.format("%Y-%m-%d")
    );
  }
}

fn print_request(request: &CollectionRequest) {
  println!("Request #{}", request.id);
  println!("  Status:   {}", request.status);
  println!(
    "  Material: {} ({:.1} kg x {})",
    request.material, request.weight_kg, request.quantity
  );
  println!("  Address:  {}", request.address);
  println!("  Client:   {} (#{})", request.client_name, request.client_id);
  match (&request.partner_name, request.partner_id) {
    (Some(name), Some(id)) => println!("  Partner:  {} (#{})", name, id),
    _ => println!("  Partner:  not yet assigned"),
  }
  println!(
    "  Payment:  {} (R$ {:.2})",
    request.payment_status, request.payment_amount
  );
  if let Some(notes) = &request.notes {
    println!("  Notes:    {}", notes);
  }
  if !request.image_urls.is_empty() {
    println!("  Images:   {}", request.image_urls.len());
  }
  println!("  Created:  {}", request.created_at.format("%Y-%m-%d %H:%M"));
  println!("  Updated:  {}", request.updated_at.format("%Y-%m-%d %H:%M"));
}

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated. Counts chars, not bytes, so accented names cut cleanly.
fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_accented_string() {
    assert_eq!(truncate("Papelão ondulado", 10), "Papelão...");
  }
}
