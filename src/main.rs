mod clock;
mod config;
mod controllers;
mod gateway;
mod models;
mod sentiment;

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use clock::SystemClock;
use config::AppConfig;
use controllers::{ConversationController, NewsFeedController, UiEffect};
use gateway::{HttpGateway, RemoteGateway};

const HELP: &str = "\
commands:
  open | min | close      toggle the assistant widget
  say <text>              send a message to the assistant
  ask [n]                 list quick questions, or send the n-th one
  goto <route>            simulate navigation (re-derives auth/route)
  reset                   discard the conversation and re-seed it
  news <ticker>           search news for a ticker
  mood <index>            classify sentiment for a search result
  live                    refresh the live feed now
  feed                    show the current live feed
  quit";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env();
    tracing::info!(api_base = %config.api_base, authenticated = config.is_authenticated(), "starting");

    let gateway: Arc<dyn RemoteGateway> = Arc::new(HttpGateway::new(config.api_base.clone()));
    let clock = Arc::new(SystemClock);

    let chat = ConversationController::new(
        Arc::clone(&gateway),
        clock.clone(),
        config.is_authenticated(),
        "/",
    );
    let news = NewsFeedController::new(gateway, clock);
    news.start_live_poll();

    println!("stockdesk shell — type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "quit" | "exit" => break,
            "help" => println!("{HELP}"),
            "open" => report_effects(&chat.toggle_widget().await),
            "min" => report_effects(&chat.toggle_minimize().await),
            "close" => chat.close().await,
            "say" => {
                chat.set_input(rest).await;
                report_effects(&chat.submit().await);
                print_transcript_tail(&chat).await;
            }
            "ask" => handle_ask(&chat, rest).await,
            "goto" => {
                let route = if rest.is_empty() { "/" } else { rest };
                chat.refresh_environment(config.is_authenticated(), route).await;
                println!("route is now {route}");
            }
            "reset" => {
                chat.reset().await;
                println!("conversation re-seeded");
            }
            "news" => {
                news.search(rest).await;
                print_search(&news).await;
            }
            "mood" => match rest.parse::<usize>() {
                Ok(index) => {
                    news.analyze_sentiment(index).await;
                    print_annotations(&news).await;
                }
                Err(_) => println!("usage: mood <index>"),
            },
            "live" => {
                news.refresh_live().await;
                print_live(&news).await;
            }
            "feed" => print_live(&news).await,
            _ => println!("unknown command; type 'help'"),
        }
    }

    Ok(())
}

async fn handle_ask(chat: &ConversationController, rest: &str) {
    let Some(questions) = chat.quick_questions().await else {
        println!("quick questions are only offered before the first exchange");
        return;
    };
    if rest.is_empty() {
        for (i, question) in questions.iter().enumerate() {
            println!("  {i}: {question}");
        }
        return;
    }
    match rest.parse::<usize>() {
        Ok(index) if index < questions.len() => {
            report_effects(&chat.submit_text(questions[index]).await);
            print_transcript_tail(chat).await;
        }
        _ => println!("usage: ask [0..{}]", questions.len().saturating_sub(1)),
    }
}

fn report_effects(effects: &[UiEffect]) {
    for effect in effects {
        match effect {
            UiEffect::ScrollToLatest => println!("(scroll to latest)"),
            UiEffect::FocusInput => println!("(focus input)"),
        }
    }
}

async fn print_transcript_tail(chat: &ConversationController) {
    let messages = chat.messages().await;
    for message in messages.iter().rev().take(2).rev() {
        println!("[{}] {}", message.sender.as_str(), message.text);
    }
}

async fn print_search(news: &NewsFeedController) {
    let search = news.ticker_search().await;
    if let Some(error) = &search.error {
        println!("! {error}");
    }
    for (i, article) in search.results.iter().enumerate() {
        println!("  {i}: {} — {}", article.title, article.url);
    }
}

async fn print_live(news: &NewsFeedController) {
    let live = news.live_feed().await;
    if live.loading {
        println!("(refreshing…)");
    }
    if let Some(error) = &live.error {
        println!("! {error}");
    }
    if let Some(at) = live.last_refreshed {
        println!("last refreshed {}", at.to_rfc3339());
    }
    for article in &live.articles {
        let source = article.source.as_deref().unwrap_or("unknown");
        println!("  [{source}] {}", article.title);
    }
}

async fn print_annotations(news: &NewsFeedController) {
    let search = news.ticker_search().await;
    if let Some(error) = &search.error {
        println!("! {error}");
    }
    let annotations = news.annotations().await;
    let mut indices: Vec<_> = annotations.keys().copied().collect();
    indices.sort_unstable();
    for index in indices {
        let annotation = &annotations[&index];
        println!(
            "  {index}: {} ({})",
            annotation.label, annotation.confidence
        );
    }
}
