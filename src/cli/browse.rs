//! Line-driven browser over the fully cached patients list

use anyhow::Result;
use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, warn};

use super::render;
use crate::config::Config;
use crate::store::{Pagination, PatientsStore, StoreError};

const HELP: &str = "/text search   n/p next/prev   f/l first/last   <number> go to page   \
size <n> page size   open <id> details   r reload   q quit";

/// Browse all patients interactively, reading commands from stdin
#[derive(Args)]
pub struct BrowseCommand {
    #[arg(short = 's', long)]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseInput {
    Search(String),
    Next,
    Prev,
    First,
    Last,
    Page(usize),
    Size(usize),
    Open(String),
    Reload,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<BrowseInput> {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return Some(BrowseInput::Search(term.trim().to_string()));
    }

    let mut words = line.split_whitespace();
    let input = match (words.next()?, words.next()) {
        ("n", None) => BrowseInput::Next,
        ("p", None) => BrowseInput::Prev,
        ("f", None) => BrowseInput::First,
        ("l", None) => BrowseInput::Last,
        ("r", None) => BrowseInput::Reload,
        ("?" | "h" | "help", None) => BrowseInput::Help,
        ("q" | "quit", None) => BrowseInput::Quit,
        ("size", Some(size)) => BrowseInput::Size(size.parse().ok()?),
        ("open", Some(id)) => BrowseInput::Open(id.to_string()),
        (page, None) => BrowseInput::Page(page.parse().ok()?),
        _ => return None,
    };
    Some(input)
}

/// UI-side browsing state: the pagination controller plus the store
struct Browser<'a> {
    store: &'a PatientsStore,
    pagination: Pagination,
    page_size_options: Vec<usize>,
}

impl<'a> Browser<'a> {
    fn new(store: &'a PatientsStore, page_size: usize, page_size_options: Vec<usize>) -> Self {
        Self {
            store,
            pagination: Pagination::new(page_size),
            page_size_options,
        }
    }

    async fn reload(&mut self) -> Result<()> {
        self.store.load_all_patients().await?;
        self.pagination.go_to_first_page();
        self.refresh().await
    }

    /// Show the controller's page and bring its total in line with the list
    async fn refresh(&mut self) -> Result<()> {
        self.store
            .filter_patients(
                Some(self.pagination.current_page()),
                Some(self.pagination.page_size()),
            )
            .await?;
        let total = self.store.list().await.total;
        let before = self.pagination.current_page();
        self.pagination.set_total(total);
        if self.pagination.current_page() != before {
            debug!(
                "Page {} is past the end, moving to {}",
                before,
                self.pagination.current_page()
            );
            self.store
                .filter_patients(Some(self.pagination.current_page()), None)
                .await?;
        }
        Ok(())
    }

    /// Apply one command and return the text to print, or `None` to quit
    async fn apply(&mut self, input: BrowseInput) -> Result<Option<String>> {
        let moved = match input {
            BrowseInput::Quit => return Ok(None),
            BrowseInput::Help => return Ok(Some(HELP.to_string())),
            BrowseInput::Open(id) => {
                let id = super::patients::parse_patient_id(&id)?;
                super::patients::show(self.store, &id, None, None).await?;
                return Ok(Some(String::new()));
            }
            BrowseInput::Reload => {
                self.reload().await?;
                true
            }
            BrowseInput::Search(term) => {
                self.store.set_search(term).await;
                self.pagination.go_to_first_page();
                true
            }
            BrowseInput::Size(size) => {
                if !self.page_size_options.contains(&size) {
                    return Ok(Some(format!(
                        "Page size must be one of {:?}",
                        self.page_size_options
                    )));
                }
                self.pagination.set_page_size(size);
                true
            }
            BrowseInput::Next => self.pagination.go_to_next_page(),
            BrowseInput::Prev => self.pagination.go_to_prev_page(),
            BrowseInput::First => {
                self.pagination.go_to_first_page();
                true
            }
            BrowseInput::Last => {
                self.pagination.go_to_last_page();
                true
            }
            BrowseInput::Page(page) => self.pagination.go_to_page(page),
        };

        if moved {
            self.refresh().await?;
        }
        Ok(Some(render::patients_page(&self.store.list().await)))
    }
}

impl BrowseCommand {
    pub async fn execute(&self, store: &PatientsStore, config: &Config) -> Result<()> {
        let page_size = self.page_size.unwrap_or(config.default_page_size);
        let mut browser = Browser::new(store, page_size, config.page_size_options.clone());

        browser.reload().await?;
        println!("{}", render::patients_page(&store.list().await));
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let Some(input) = parse_input(&line) else {
                if !line.trim().is_empty() {
                    println!("Unknown command. {}", HELP);
                }
                continue;
            };

            match browser.apply(input).await {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => break,
                // Report once, then keep browsing with a clean slate
                Err(e) => {
                    if e
                        .downcast_ref::<StoreError>()
                        .is_some_and(StoreError::is_invalid_request)
                    {
                        error!("Browse command was rejected: {}", e);
                    } else {
                        warn!("Browse command failed: {}", e);
                    }
                    println!("Error: {}", e);
                    store.clear_error().await;
                }
            }
        }

        Ok(())
    }
}
