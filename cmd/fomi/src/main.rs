//! # Fomí Binary
//!
//! A diagnostic shell around the client core: assembles a backend (chosen
//! at compile time), builds the store, bootstraps it and prints what the
//! screens would render. The mobile shells embed the same crates; this
//! binary exists so the state layer can be exercised without them.

use std::sync::Arc;

use services::AppStore;

fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Prints the cached state the way the Feed and Lists screens consume it.
fn report(store: &AppStore) {
    let state = store.snapshot();
    match &state.current_user {
        Some(me) => println!(
            "signed in as {} (@{}) — {} reviews, {} followers, {} following",
            me.profile.name,
            me.profile.username,
            me.stats.reviews_count,
            me.stats.followers_count,
            me.stats.following_count,
        ),
        None => println!("no session"),
    }
    println!("lists: {}", state.lists.len());
    for list in &state.lists {
        let marker = if list.is_default { " (default)" } else { "" };
        println!("  {}{} — {} places", list.name, marker, list.count);
    }
    println!("feed: {} reviews", state.reviews.len());
    for review in &state.reviews {
        let author = review
            .author
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("?");
        let flags = format!(
            "{}{}",
            if review.is_liked { "♥" } else { "-" },
            if review.is_saved { "📌" } else { "-" }
        );
        println!(
            "  [{}] {} — @{} ({:.1}, {} likes, {} comments)",
            flags,
            review.title,
            author,
            review.scores.average(),
            review.likes_count,
            review.comments_count,
        );
    }
}

#[cfg(all(feature = "backend-rest", not(feature = "backend-memory")))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use backend_adapters::rest::RestBackend;

    let cfg = configs::load().context("loading configuration")?;
    init_tracing(&cfg.log.filter);

    // 1. Assemble the REST adapter against the configured project.
    let backend = Arc::new(RestBackend::new(&cfg.backend.url, cfg.backend.anon_key)?);

    // 2. One adapter value serves all three ports.
    let store = AppStore::new(backend.clone(), backend.clone(), backend);

    // 3. Smoke sign-in when credentials ride in the environment; plain
    //    session-restore bootstrap otherwise.
    match (std::env::var("FOMI_EMAIL"), std::env::var("FOMI_PASSWORD")) {
        (Ok(email), Ok(password)) => {
            tracing::info!("🚀 signing in as {email}");
            store.sign_in(&email, &password).await?;
        }
        _ => store.init().await,
    }

    report(&store);
    Ok(())
}

#[cfg(feature = "backend-memory")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use backend_adapters::memory::MemoryBackend;

    init_tracing("info");
    tracing::info!("🚀 Fomí offline demo (in-memory backend)");

    // 1. Seed a tiny neighborhood.
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_user("ana@fomi.app", "demo", "Ana Lima", "analima");
    let bruno = backend.seed_user("bruno@fomi.app", "demo", "Bruno Reis", "brunoreis");
    let cantina = backend.seed_restaurant("Cantina da Nona", -23.561, -46.656, &["italiana"]);
    let sushi = backend.seed_restaurant("Sushi Koba", -23.563, -46.654, &["japonesa"]);
    backend.seed_review(
        bruno,
        cantina,
        "Massa fresca impecável",
        "Nhoque no ponto e atendimento atencioso.",
    );
    backend.seed_review(bruno, sushi, "Balcão disputado", "Vale encarar a fila.");

    // 2. Build the store and sign the demo user in.
    let store = AppStore::new(backend.clone(), backend.clone(), backend);
    store.sign_in("ana@fomi.app", "demo").await?;

    // 3. Exercise the mutation layer the way the screens would.
    let first_review = store.snapshot().reviews[0].id;
    store.toggle_like(first_review).await?;
    store.toggle_save_restaurant(cantina).await?;
    store.create_list("Baratos e bons", false, None).await?;
    store.follow_user(bruno).await?;
    store.add_comment(first_review, "Anotado pro fim de semana!").await?;
    store.refresh_feed().await;

    report(&store);
    Ok(())
}

#[cfg(not(any(feature = "backend-rest", feature = "backend-memory")))]
compile_error!("enable the backend-rest or backend-memory feature");
