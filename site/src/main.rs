//! Site walkthrough binary
//!
//! Drives the application store through a member's visit: load the catalog,
//! sign in, buy a ticket, check it at the door, and (when
//! `ANTHROPIC_API_KEY` is set) ask the community assistant a question.

use anyhow::Context;
use bashi_anthropic::AnthropicClient;
use bashi_runtime::Store;
use bashi_site::chat::{AnthropicChatBackend, ChatAction, ChatEnvironment, ChatReducer, ChatState};
use bashi_site::checkout::{CheckoutAction, CheckoutPhase, SimulatedPaymentGateway};
use bashi_site::routing::{Navigation, Page};
use bashi_site::verification::{verify_ticket, VerificationReport};
use bashi_site::views::{self, LoginForm, PageView};
use bashi_site::{AppAction, AppEnvironment, AppReducer, AppState, Config, DataService, HttpDataService, SeedDataService};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("loading configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("=== Oklahomabashi ===\n");

    let data: Arc<dyn DataService> = match &config.api_base_url {
        Some(url) => {
            tracing::info!(%url, "Using remote data service");
            Arc::new(HttpDataService::new(url.clone()))
        },
        None => SeedDataService::shared(),
    };
    let checkout = config.checkout_config();
    let env = AppEnvironment::new(
        data,
        SimulatedPaymentGateway::shared(checkout.payment_delay),
        checkout.clone(),
    );
    let store = Store::new(AppState::at("#home"), AppReducer::new(), env);

    // Catalog
    let mut loading = store.send(AppAction::LoadData).await?;
    if loading.wait_with_timeout(Duration::from_secs(10)).await.is_err() {
        println!("Catalog is still loading; continuing without it.");
    }

    store
        .state(|s| {
            if let PageView::Home(home) = views::render(s, &checkout) {
                println!("Upcoming events:");
                for event in home.featured_events {
                    println!("  {} ({}, {}) {} tickets left", event.title, event.department.label(), event.price, event.remaining());
                }
            }
        })
        .await;

    // Sign in
    let user = LoginForm {
        email: "guest@example.com".to_string(),
        password: String::new(),
    }
    .submit(&config.admin_email);
    println!("\n>>> Signing in as {}", user.name);
    store.send(AppAction::Login { user }).await?;

    store
        .state(|s| {
            let nav = Navigation::for_session(s.router.route(), s.user.as_ref());
            let labels: Vec<&str> = nav.account.iter().map(|l| l.label).collect();
            println!("Account menu: {}", labels.join(" | "));
        })
        .await;

    // Checkout
    let Some(event_id) = store.state(|s| s.events.get(1).or_else(|| s.events.first()).map(|e| e.id.clone())).await
    else {
        println!("\nNo events to buy tickets for.");
        return Ok(());
    };

    store
        .send(AppAction::Navigate {
            page: Page::BuyTicket,
            entity_id: Some(event_id.to_string()),
        })
        .await?;
    println!("\n>>> Paying for {event_id}");

    let mut payment = store
        .send(AppAction::Checkout(CheckoutAction::Submit { event_id }))
        .await?;
    if payment
        .wait_with_timeout(checkout.payment_timeout + Duration::from_secs(1))
        .await
        .is_err()
    {
        println!("Payment is still processing.");
    }
    if let CheckoutPhase::Failed { reason, .. } = store.state(|s| s.checkout.clone()).await {
        println!("Payment failed: {reason}");
    }

    let ticket = store
        .state(|s| {
            for notice in &s.notices {
                println!("Notice: {}", notice.message);
            }
            println!("Now at #{}", s.router.fragment());
            s.tickets.last().map(|t| (t.id.clone(), t.qr_code.clone()))
        })
        .await;

    // Door check
    if let Some((ticket_id, qr_code)) = ticket {
        println!("\nTicket {ticket_id} (QR {qr_code})");
        let report = store
            .state(|s| VerificationReport::new(&verify_ticket(&s.tickets, ticket_id.as_str()), &s.events))
            .await;
        println!("Verification: {}", serde_json::to_string_pretty(&report)?);
    }

    // Assistant
    if std::env::var("ANTHROPIC_API_KEY").is_ok_and(|k| !k.trim().is_empty()) {
        ask_assistant(&config).await?;
    } else {
        println!("\nANTHROPIC_API_KEY not set; skipping the assistant.");
    }

    store.shutdown(Duration::from_secs(5)).await?;
    println!("\n=== Done ===");
    Ok(())
}

async fn ask_assistant(config: &Config) -> anyhow::Result<()> {
    let client = AnthropicClient::from_env()?;
    let backend = AnthropicChatBackend::new(client)
        .with_model(config.chat.model.clone())
        .with_max_tokens(config.chat.max_tokens)
        .with_idle_timeout(config.chat_idle_timeout());

    let chat = Store::with_broadcast_capacity(
        ChatState::default(),
        ChatReducer,
        ChatEnvironment::new(Arc::new(backend)),
        1024,
    );
    chat.send(ChatAction::Open).await?;

    let question = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What happens at Noboborsho?".to_string());
    let greeting = chat.state(|s| s.transcript.first().map(|e| e.text.clone())).await;
    println!("\nAssistant: {}", greeting.unwrap_or_default());
    println!("You: {question}");
    print!("Assistant: ");

    let mut replies = chat.subscribe_actions();
    chat.send(ChatAction::Submit { text: question }).await?;

    let mut stdout = std::io::stdout();
    loop {
        match replies.recv().await {
            Ok(ChatAction::Fragment { text }) => {
                print!("{text}");
                stdout.flush()?;
            },
            Ok(ChatAction::StreamFinished | ChatAction::StreamFailed { .. }) | Err(RecvError::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => {},
        }
    }
    // Failed replies are replaced in the transcript
    let reply = chat
        .state(|s| s.transcript.last().map(|e| e.text.clone()).unwrap_or_default())
        .await;
    if reply == bashi_site::chat::APOLOGY {
        println!("{reply}");
    }
    println!();

    chat.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
