use crate::models::{ContactDto, ImportOutcome, ListResponse};

/// Print a single contact, one field per line
pub fn print_contact(contact: &ContactDto) {
    println!("{}\n", contact.name);
    println!("  id       {}", contact.id);
    println!("  born     {}", contact.date_of_birth);
    println!("  married  {}", yes_no(contact.married));
    println!("  phone    {}", contact.phone);
    println!("  salary   {}", contact.salary);
}

/// Print one page of a list response as a table with a position footer
pub fn print_contact_table(response: &ListResponse, start: u64) {
    if response.data.is_empty() {
        println!("No contacts.");
        return;
    }

    let name_width = response
        .data
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(4)
        .clamp(4, 40);

    println!(
        "{:<36}  {:<name_width$}  {:<10}  {:<7}  {:<16}  {:>12}",
        "ID", "NAME", "BORN", "MARRIED", "PHONE", "SALARY"
    );
    for c in &response.data {
        println!(
            "{:<36}  {:<name_width$}  {:<10}  {:<7}  {:<16}  {:>12}",
            c.id.to_string(),
            truncate(&c.name, name_width),
            c.date_of_birth.to_string(),
            yes_no(c.married),
            c.phone,
            c.salary.to_string()
        );
    }

    let first = start + 1;
    let last = start + response.data.len() as u64;
    if response.records_filtered < response.records_total {
        println!(
            "\n{}-{} of {} (filtered from {})",
            first, last, response.records_filtered, response.records_total
        );
    } else {
        println!("\n{}-{} of {}", first, last, response.records_total);
    }
}

pub fn print_import_summary(outcome: &ImportOutcome, dry_run: bool) {
    let verb = if dry_run { "Would import" } else { "Imported" };
    println!("{} {} contacts", verb, outcome.imported);

    if outcome.failed > 0 {
        println!("Rejected {} rows", outcome.failed);
    }
    for error in &outcome.errors {
        println!("  {}", error);
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut.trim_end())
    } else {
        text.to_string()
    }
}
