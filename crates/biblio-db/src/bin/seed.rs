//! # Seed Data Generator
//!
//! Populates the database with test books and members for development.
//!
//! ## Usage
//! ```bash
//! # Seed a bookstore catalog (default: 120 books, 40 members)
//! cargo run -p biblio-db --bin seed
//!
//! # Custom amounts
//! cargo run -p biblio-db --bin seed -- --books 500 --members 100
//!
//! # Seed as a library (zero-priced catalog, free loans)
//! cargo run -p biblio-db --bin seed -- --library
//!
//! # Specify database path
//! cargo run -p biblio-db --bin seed -- --db ./data/biblio.db
//! ```
//!
//! ## Generated Data
//! Books spread across fiction and nonfiction genres, each with:
//! - Unique ISBN: `978` + 10 digits derived from the index
//! - Deterministic pseudo-random price: $8.99 - $34.99 (bookstore only)
//! - Deterministic pseudo-random stock: 0 - 8 copies (some start sold out)
//! - Publication year between 1950 and 2024
//!
//! Members get names combined from two small name pools and a unique email.

use std::env;

use tracing_subscriber::EnvFilter;

use biblio_core::{Genre, NewBook, NewMember, OrgContext, DEFAULT_ORGANIZATION_ID};
use biblio_db::{Database, DbConfig};

/// Titles and authors per genre for realistic catalog data.
const CATALOG: &[(Genre, &[(&str, &str)])] = &[
    (
        Genre::ScienceFiction,
        &[
            ("Dune", "Frank Herbert"),
            ("The Left Hand of Darkness", "Ursula K. Le Guin"),
            ("Foundation", "Isaac Asimov"),
            ("Neuromancer", "William Gibson"),
            ("Hyperion", "Dan Simmons"),
            ("The Dispossessed", "Ursula K. Le Guin"),
            ("Snow Crash", "Neal Stephenson"),
            ("Solaris", "Stanislaw Lem"),
            ("The Three-Body Problem", "Liu Cixin"),
            ("A Canticle for Leibowitz", "Walter M. Miller Jr."),
        ],
    ),
    (
        Genre::Fantasy,
        &[
            ("The Hobbit", "J.R.R. Tolkien"),
            ("A Wizard of Earthsea", "Ursula K. Le Guin"),
            ("The Name of the Wind", "Patrick Rothfuss"),
            ("Mistborn", "Brandon Sanderson"),
            ("The Fifth Season", "N.K. Jemisin"),
            ("Jonathan Strange & Mr Norrell", "Susanna Clarke"),
            ("The Last Unicorn", "Peter S. Beagle"),
            ("Piranesi", "Susanna Clarke"),
            ("The Lies of Locke Lamora", "Scott Lynch"),
            ("Tigana", "Guy Gavriel Kay"),
        ],
    ),
    (
        Genre::Mystery,
        &[
            ("The Big Sleep", "Raymond Chandler"),
            ("And Then There Were None", "Agatha Christie"),
            ("The Maltese Falcon", "Dashiell Hammett"),
            ("In the Woods", "Tana French"),
            ("The Name of the Rose", "Umberto Eco"),
            ("Gorky Park", "Martin Cruz Smith"),
            ("The Daughter of Time", "Josephine Tey"),
            ("Smilla's Sense of Snow", "Peter Hoeg"),
            ("A Study in Scarlet", "Arthur Conan Doyle"),
            ("The Moonstone", "Wilkie Collins"),
        ],
    ),
    (
        Genre::Classics,
        &[
            ("Pride and Prejudice", "Jane Austen"),
            ("Middlemarch", "George Eliot"),
            ("Moby-Dick", "Herman Melville"),
            ("Anna Karenina", "Leo Tolstoy"),
            ("Great Expectations", "Charles Dickens"),
            ("Jane Eyre", "Charlotte Bronte"),
            ("The Count of Monte Cristo", "Alexandre Dumas"),
            ("Wuthering Heights", "Emily Bronte"),
            ("Crime and Punishment", "Fyodor Dostoevsky"),
            ("To the Lighthouse", "Virginia Woolf"),
        ],
    ),
    (
        Genre::History,
        &[
            ("The Guns of August", "Barbara W. Tuchman"),
            ("SPQR", "Mary Beard"),
            ("A Distant Mirror", "Barbara W. Tuchman"),
            ("The Silk Roads", "Peter Frankopan"),
            ("1491", "Charles C. Mann"),
            ("The Making of the Atomic Bomb", "Richard Rhodes"),
            ("Citizens", "Simon Schama"),
            ("The Crusades", "Thomas Asbridge"),
            ("Salt: A World History", "Mark Kurlansky"),
            ("Embracing Defeat", "John W. Dower"),
        ],
    ),
    (
        Genre::Science,
        &[
            ("A Brief History of Time", "Stephen Hawking"),
            ("The Selfish Gene", "Richard Dawkins"),
            ("Silent Spring", "Rachel Carson"),
            ("The Double Helix", "James D. Watson"),
            ("Cosmos", "Carl Sagan"),
            ("The Emperor of All Maladies", "Siddhartha Mukherjee"),
            ("Entangled Life", "Merlin Sheldrake"),
            ("The Gene", "Siddhartha Mukherjee"),
            ("Chaos", "James Gleick"),
            ("The Sixth Extinction", "Elizabeth Kolbert"),
        ],
    ),
];

/// Name pools for member generation.
const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Carmen", "Dmitri", "Elif", "Farid", "Greta", "Hiro",
    "Ines", "Jonas", "Kavya", "Lucas", "Mina", "Noor", "Olof", "Priya",
    "Quentin", "Rosa", "Samir", "Tessa",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Brandt", "Castellanos", "Duval", "Eriksen", "Fontaine",
    "Gupta", "Haddad", "Ivanova", "Jansen", "Kowalski", "Lindqvist",
    "Moreau", "Nakamura", "Okafor", "Petrov",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut book_count: usize = 120;
    let mut member_count: usize = 40;
    let mut db_path =
        env::var("BIBLIO_DB_PATH").unwrap_or_else(|_| String::from("./biblio_dev.db"));
    let mut library = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--books" | "-b" => {
                if i + 1 < args.len() {
                    book_count = args[i + 1].parse().unwrap_or(120);
                    i += 1;
                }
            }
            "--members" | "-m" => {
                if i + 1 < args.len() {
                    member_count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--library" | "-l" => {
                library = true;
            }
            "--help" | "-h" => {
                println!("Biblio Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -b, --books <N>    Number of books to generate (default: 120)");
                println!("  -m, --members <N>  Number of members to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./biblio_dev.db,");
                println!("                     or the BIBLIO_DB_PATH environment variable)");
                println!("  -l, --library      Seed as a library (free loans, zero prices)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let ctx = if library {
        OrgContext::library(DEFAULT_ORGANIZATION_ID)
    } else {
        OrgContext::book_store(DEFAULT_ORGANIZATION_ID)
    };

    println!("🌱 Biblio Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Mode:     {}", if library { "library" } else { "bookstore" });
    println!("Books:    {}", book_count);
    println!("Members:  {}", member_count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing data
    let existing = db.books().count(&ctx.organization_id).await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate books
    println!();
    println!("Generating books...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    'books: loop {
        for (genre, titles) in CATALOG {
            for (title, author) in titles.iter() {
                if generated >= book_count {
                    break 'books;
                }

                let book = generate_book(*genre, title, author, generated);

                if let Err(e) = db.books().insert(&ctx, book).await {
                    eprintln!("Failed to insert '{}': {}", title, e);
                    continue;
                }

                generated += 1;

                if generated % 100 == 0 {
                    println!("  Generated {} books...", generated);
                }
            }
        }
    }

    println!("✓ Generated {} books", generated);

    // Generate members
    println!();
    println!("Generating members...");

    let mut registered = 0;
    for idx in 0..member_count {
        let member = generate_member(idx);

        if let Err(e) = db.members().insert(&ctx, member).await {
            eprintln!("Failed to insert member #{}: {}", idx, e);
            continue;
        }

        registered += 1;
    }

    println!("✓ Registered {} members", registered);

    // Verify
    println!();
    println!("Verifying...");

    let total_books = db.books().count(&ctx.organization_id).await?;
    let total_members = db.members().count(&ctx.organization_id).await?;
    println!("  Books in database:   {}", total_books);
    println!("  Members in database: {}", total_members);

    let hits = db.books().search(&ctx.organization_id, "le guin", 10).await?;
    println!("  Search 'le guin':    {} results", hits.len());

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seed complete in {:.2}s", elapsed.as_secs_f64());

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=biblio=trace` - Show trace for biblio crates only
/// - Default: INFO level, repository debug, sqlx quiet
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,biblio=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Generates a single book with deterministic pseudo-random fields.
///
/// Repeat passes over the title table become numbered editions so the
/// ISBN stays unique while titles read naturally.
fn generate_book(genre: Genre, title: &str, author: &str, seed: usize) -> NewBook {
    let table_size: usize = CATALOG.iter().map(|(_, titles)| titles.len()).sum();
    let edition = seed / table_size + 1;

    let title = if edition > 1 {
        format!("{} (ed. {})", title, edition)
    } else {
        title.to_string()
    };

    // ISBN-shaped but not checksum-valid, like most fixture data
    let isbn = format!("978{:010}", 4_100_000_000u64 + seed as u64);

    // Price $8.99 - $34.99; a library context zeroes this at insert
    let price_cents = 899 + ((seed * 37) % 2601) as i64;

    // Stock 0 - 8; roughly one in nine titles starts sold out
    let stock = ((seed * 13) % 9) as i64;

    let mut book = NewBook::new(title, author, isbn, genre, price_cents, stock);
    book.publication_year = Some(1950 + (seed % 75) as i32);
    book.language = Some("en".to_string());
    if seed % 7 == 0 {
        book.tags = vec!["staff-pick".to_string()];
    }

    book
}

/// Generates a single member with a unique email.
fn generate_member(idx: usize) -> NewMember {
    let first = FIRST_NAMES[idx % FIRST_NAMES.len()];
    let last = LAST_NAMES[(idx / FIRST_NAMES.len() + idx) % LAST_NAMES.len()];

    let name = format!("{} {}", first, last);
    let email = format!("{}.{}{}@example.com", first.to_lowercase(), last.to_lowercase(), idx);

    let mut member = NewMember::new(name, email);
    if idx % 3 == 0 {
        member.phone = Some(format!("+1-555-{:04}", 1000 + idx));
    }

    member
}
