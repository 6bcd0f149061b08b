use crate::conversation::{Message, MessageKind, Sender};
use crate::settings::ChatSettings;
use console::style;
use termimad::MadSkin;

/// Render markdown-looking agent replies through termimad, plain text
/// otherwise (the backend mixes both).
pub fn display_agent_body(body: &str) {
    if body.contains("```") || body.contains('*') || body.contains('`') || body.contains('#') {
        let skin = MadSkin::default();
        skin.print_text(body);
    } else {
        println!("{}", body);
    }
}

/// Full agent reply: header, body, source files, metadata footer.
pub fn display_agent_message(message: &Message) {
    println!("\n{}", style("● assistant").bold().blue());
    display_agent_body(&message.body);

    if !message.files.is_empty() {
        println!("\n{}", style("Referenced files:").bold().dim());
        for file in &message.files {
            let location = match &file.line_range {
                Some(range) => format!(
                    "{}/{} (lines {}-{})",
                    file.repository, file.path, range.start, range.end
                ),
                None => format!("{}/{}", file.repository, file.path),
            };
            match &file.branch {
                Some(branch) => println!("  {} {} [{}]", style("-").dim(), location, branch),
                None => println!("  {} {}", style("-").dim(), location),
            }
        }
    }

    let mut footer = Vec::new();
    if let Some(secs) = message.metadata.get("processing_time").and_then(|v| v.as_f64()) {
        footer.push(format!("{:.2}s", secs));
    }
    if let Some(cost) = message.metadata.get("cost").and_then(|v| v.as_f64()) {
        footer.push(format!("${:.4}", cost));
    }
    if let Some(summary) = message.metadata.get("search_summary").and_then(|v| v.as_str()) {
        footer.push(summary.to_string());
    }
    if !footer.is_empty() {
        println!("{}", style(footer.join(" · ")).dim());
    }
}

/// Replay a saved transcript entry (either side of the conversation).
pub fn display_transcript_message(message: &Message) {
    let header = match message.sender {
        Sender::User => style("● you").bold().cyan(),
        Sender::Agent => style("● assistant").bold().blue(),
    };
    println!("\n{}", header);
    match message.kind {
        MessageKind::Text => display_agent_body(&message.body),
        MessageKind::Typing | MessageKind::Error => {
            println!("{}", style(&message.body).dim());
        }
    }
}

pub fn display_typing() {
    println!("{}", style("assistant is typing…").dim().italic());
}

/// Error banner with the manual dismiss hint. Submission stays blocked until
/// the error is dismissed.
pub fn display_error_banner(error: &str) {
    eprintln!(
        "\n{} {}",
        style("✗").bold().red(),
        style(error).bold().red()
    );
    eprintln!("{}", style("Type /dismiss to clear the error and try again.").dim());
}

pub fn display_validation_error(reason: &str) {
    eprintln!("{} {}", style("!").bold().yellow(), style(reason).yellow());
}

/// Plain error line for one-shot mode, where there is nothing to dismiss.
pub fn display_error(error: &str) {
    eprintln!("{} {}", style("✗").bold().red(), style(error).bold().red());
}

pub fn display_settings(settings: &ChatSettings) {
    let on_off = |v: bool| if v { "on" } else { "off" };
    println!("{}", style("Chat settings").bold().underlined());
    println!(
        "  proficiency level : {} ({})",
        style(settings.proficiency_level.as_str()).bold(),
        settings.proficiency_level.describe()
    );
    println!("  role              : {}", style(settings.user_role.as_str()).bold());
    println!("  product           : {}", style(settings.product_type.as_str()).bold());
    println!("  analysis type     : {}", style(settings.analysis_type.as_str()).bold());
    println!("  reasoning focus   : {}", style(settings.reasoning_focus.as_str()).bold());
    println!(
        "  knowledge sources : lucid {} · wiki {} · github {}",
        on_off(settings.include_lucid),
        on_off(settings.include_wiki),
        on_off(settings.include_github)
    );
    println!(
        "  screenshots       : {}",
        on_off(settings.include_screenshots)
    );
}

pub fn display_welcome(settings: &ChatSettings, backend_url: &str) {
    println!(
        "{}",
        style("Onboarding assistant. Type /help for commands, Ctrl+D to exit.").bold()
    );
    println!(
        "{}",
        style(format!(
            "Backend {} | answering for a {} {} on {}.",
            backend_url,
            settings.proficiency_level.as_str(),
            settings.user_role.as_str(),
            settings.product_type.as_str()
        ))
        .dim()
    );
}
