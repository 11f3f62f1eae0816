//! Plain-text rendering of list pages and patient details

use std::fmt::Write;

use crate::api::{Patient, Visit};
use crate::store::{compute, DetailSession, ListMode, ListState, PageMarker, PaginationInfo};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// "Showing a-b of t" plus the page-number strip, with the current page
/// in brackets
pub fn footer(info: &PaginationInfo, current_page: usize, total: usize) -> String {
    if total == 0 {
        return "No results".to_string();
    }

    let strip = info
        .visible_pages
        .iter()
        .map(|marker| match marker {
            PageMarker::Page(page) if *page == current_page => format!("[{}]", page),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Showing {}-{} of {}   {}{}{}",
        info.start_item,
        info.end_item,
        total,
        if info.has_prev_page { "< " } else { "" },
        strip,
        if info.has_next_page { " >" } else { "" },
    )
}

pub fn patient_row(patient: &Patient) -> String {
    format!(
        "{:<36}  {:<28}  {}  {:<18}  {}",
        patient.id,
        patient.display_name(),
        patient.date_of_birth.format(DATE_FORMAT),
        patient.phone_number,
        patient.email.as_deref().unwrap_or("-"),
    )
}

pub fn visit_row(visit: &Visit) -> String {
    format!(
        "{}  {:<9}  {}  /  {}",
        visit.visit_date.format(DATE_FORMAT),
        visit.status,
        visit.diagnosis,
        visit.treatment,
    )
}

/// The visible page of the patients list
pub fn patients_page(state: &ListState) -> String {
    let mut out = String::new();
    if !state.search.trim().is_empty() {
        let scope = match state.mode {
            ListMode::Direct => "",
            ListMode::FullCache => " (filtered locally)",
        };
        let _ = writeln!(out, "Search: {}{}", state.search.trim(), scope);
    }
    if state.loading {
        let _ = writeln!(out, "Loading...");
    }
    for patient in &state.items {
        let _ = writeln!(out, "{}", patient_row(patient));
    }
    if state.items.is_empty() && state.total > 0 {
        let _ = writeln!(out, "(page {} is empty)", state.page);
    }
    out.push_str(&footer(&state.info(), state.page, state.total));
    if let Some(error) = &state.error {
        let _ = write!(out, "\nError: {}", error);
    }
    out
}

/// The viewed patient and the loaded page of their visits
pub fn patient_details(session: &DetailSession) -> String {
    let mut out = String::new();
    if let Some(patient) = session.current() {
        let _ = writeln!(out, "{}", patient.display_name());
        let _ = writeln!(out, "  ID:            {}", patient.id);
        let _ = writeln!(out, "  Date of birth: {}", patient.date_of_birth.format(DATE_FORMAT));
        let _ = writeln!(out, "  Phone:         {}", patient.phone_number);
        if let Some(email) = &patient.email {
            let _ = writeln!(out, "  Email:         {}", email);
        }
    } else if let Some(key) = session.key() {
        let _ = writeln!(out, "Patient {}", key);
    }
    if session.loading() {
        let _ = writeln!(out, "(loading)");
    }

    let _ = writeln!(out, "\nVisits");
    for visit in session.visits() {
        let _ = writeln!(out, "  {}", visit_row(visit));
        if let Some(notes) = &visit.notes {
            let _ = writeln!(out, "      {}", notes);
        }
    }
    let info = compute(
        session.visits_total(),
        session.visits_page_size(),
        session.visits_page(),
    );
    out.push_str(&footer(&info, session.visits_page(), session.visits_total()));
    if let Some(error) = session.error() {
        let _ = write!(out, "\nError: {}", error);
    }
    out
}
