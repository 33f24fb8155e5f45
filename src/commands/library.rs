//! Library command handlers: listing and OS open pass-throughs.

use std::time::SystemTime;

use anyhow::{Context, Result, bail};

use alexandria_core::{AppConfig, LocalBookEntry, LocalLibrary, open_local_book};

use crate::cli::{LibraryArgs, OpenArgs};

pub async fn run_library_command(config: &AppConfig, args: &LibraryArgs) -> Result<()> {
    let library = LocalLibrary::new(&config.storage_root);
    let books = library.list_books().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }
    if books.is_empty() {
        println!("No books in library at {}.", library.root().display());
        return Ok(());
    }
    for (index, book) in books.iter().enumerate() {
        println!("{:>3}. {}", index + 1, render_book_row(book));
    }
    Ok(())
}

pub async fn run_open_command(config: &AppConfig, args: &OpenArgs) -> Result<()> {
    let library = LocalLibrary::new(&config.storage_root);
    let books = library.list_books().await;
    let index = usize::from(args.index);
    let Some(book) = books.get(index - 1) else {
        bail!(
            "No book #{index} in library at {} ({} book(s))",
            library.root().display(),
            books.len()
        );
    };
    open_local_book(book).context("Failed to open book")?;
    println!("Opened {}", book.file_path.display());
    Ok(())
}

pub fn run_open_dir_command(config: &AppConfig) -> Result<()> {
    let library = LocalLibrary::new(&config.storage_root);
    library
        .open_storage_directory()
        .context("Failed to open library directory")?;
    println!("Opened {}", library.root().display());
    Ok(())
}

fn render_book_row(book: &LocalBookEntry) -> String {
    let author = book
        .metadata
        .first_author()
        .map(|author| format!(" by {author}"))
        .unwrap_or_default();
    let file = book
        .file_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!(
        "{}{} [{}] opened {}",
        book.metadata.title(),
        author,
        file,
        render_age(book.last_access)
    )
}

fn render_age(at: SystemTime) -> String {
    let Ok(elapsed) = SystemTime::now().duration_since(at) else {
        return "just now".to_string();
    };
    let secs = elapsed.as_secs();
    match secs {
        0..60 => "just now".to_string(),
        60..3600 => format!("{}m ago", secs / 60),
        3600..86_400 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}
