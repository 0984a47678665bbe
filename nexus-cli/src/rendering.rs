// nexus-cli/src/rendering.rs

//! Terminal rendering for assistant replies. Prose goes through termimad,
//! fenced code blocks through syntect.

use anyhow::{Context, Result, anyhow};
use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use pulldown_cmark_to_cmark::cmark;
use std::io::{self, Write};
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};
use termimad::{
    MadSkin,
    crossterm::style::{Attribute, Color, ResetColor, SetAttribute, SetForegroundColor},
};

const CODE_THEME_NAME: &str = "base16-ocean.dark";

lazy_static! {
    static ref SYNTAXES: SyntaxSet = SyntaxSet::load_defaults_newlines();
    static ref THEMES: ThemeSet = ThemeSet::load_defaults();
}

fn code_theme() -> Option<&'static Theme> {
    THEMES.themes.get(CODE_THEME_NAME)
}

/// A reply split into the parts that render differently.
#[derive(Debug, PartialEq)]
enum Segment {
    Prose(String),
    Code { language: Option<String>, body: String },
}

fn segments(markdown: &str) -> Result<Vec<Segment>> {
    let mut out = Vec::new();
    let mut prose: Vec<Event<'_>> = Vec::new();
    let mut code: Option<(Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, Options::empty()) {
        if let Some((_, body)) = code.as_mut() {
            match event {
                Event::Text(text) => body.push_str(&text),
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((language, body)) = code.take() {
                        out.push(Segment::Code { language, body });
                    }
                }
                _ => {}
            }
            continue;
        }
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(lang))) => {
                push_prose(&mut out, &mut prose)?;
                let language = Some(lang.trim().to_string()).filter(|l| !l.is_empty());
                code = Some((language, String::new()));
            }
            event => prose.push(event),
        }
    }
    push_prose(&mut out, &mut prose)?;
    Ok(out)
}

fn push_prose(out: &mut Vec<Segment>, events: &mut Vec<Event<'_>>) -> Result<()> {
    if events.is_empty() {
        return Ok(());
    }
    let mut text = String::new();
    cmark(events.iter(), &mut text).map_err(|e| anyhow!("Failed to rebuild markdown: {}", e))?;
    events.clear();
    out.push(Segment::Prose(text));
    Ok(())
}

fn skin() -> MadSkin {
    let mut skin = MadSkin::default();
    skin.inline_code.set_fg(Color::Cyan);
    skin.inline_code.set_bg(Color::Reset);
    skin.code_block.set_fg(Color::Reset);
    skin.code_block.set_bg(Color::Reset);
    skin
}

fn syntax_for(language: Option<&str>) -> &'static SyntaxReference {
    let token = language.map(|l| match l.to_lowercase().as_str() {
        "shell" | "sh" | "zsh" => "bash".to_string(),
        "js" => "javascript".to_string(),
        "ts" => "typescript".to_string(),
        "py" => "python".to_string(),
        "yml" => "yaml".to_string(),
        "rs" => "rust".to_string(),
        "md" => "markdown".to_string(),
        other => other.to_string(),
    });
    token
        .and_then(|t| SYNTAXES.find_syntax_by_token(&t))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text())
}

fn write_code<W: Write>(writer: &mut W, language: Option<&str>, body: &str) -> Result<()> {
    let Some(theme) = code_theme() else {
        write!(writer, "{}", body)?;
        return Ok(());
    };
    let mut highlighter = HighlightLines::new(syntax_for(language), theme);

    for line in LinesWithEndings::from(body) {
        let ranges = highlighter
            .highlight_line(line, &SYNTAXES)
            .context("Failed to highlight code")?;
        for (style, piece) in ranges {
            let fg = style.foreground;
            if fg.a > 0 {
                write!(
                    writer,
                    "{}",
                    SetForegroundColor(Color::Rgb {
                        r: fg.r,
                        g: fg.g,
                        b: fg.b
                    })
                )?;
            }
            if style.font_style.contains(FontStyle::BOLD) {
                write!(writer, "{}", SetAttribute(Attribute::Bold))?;
            }
            if style.font_style.contains(FontStyle::ITALIC) {
                write!(writer, "{}", SetAttribute(Attribute::Italic))?;
            }
            if style.font_style.contains(FontStyle::UNDERLINE) {
                write!(writer, "{}", SetAttribute(Attribute::Underlined))?;
            }
            write!(
                writer,
                "{}{}{}",
                piece,
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
    }
    Ok(())
}

/// Writes `markdown` to stdout with styling.
pub fn print_reply(markdown: &str) -> Result<()> {
    let skin = skin();
    let mut stdout = io::stdout().lock();

    for segment in segments(markdown)? {
        match segment {
            Segment::Prose(text) => skin
                .write_text_on(&mut stdout, &text)
                .map_err(|e| anyhow!("Failed to render markdown: {}", e))?,
            Segment::Code { language, body } => {
                writeln!(stdout)?;
                write_code(&mut stdout, language.as_deref(), &body)?;
                writeln!(stdout)?;
            }
        }
    }
    stdout.flush()?;
    Ok(())
}
