//! Interactive collection of watermark fields.
//!
//! Every field not already given on the command line is asked for once.
//! Yes/no questions default to yes; only `n` or `no` turns them off. End of
//! input answers every remaining question with its default.

use crate::watermark::composer::WatermarkFields;
use std::io::{self, BufRead, Write};

/// Field values fixed before prompting. `None` means "ask".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOverrides {
    pub recipient: Option<String>,
    pub purpose: Option<String>,
    pub extra_text: Option<String>,
    pub include_date: Option<bool>,
    pub include_hash: Option<bool>,
}

impl FieldOverrides {
    /// Fill every open field with its default without asking.
    pub fn into_fields(self) -> WatermarkFields {
        WatermarkFields {
            recipient: self.recipient,
            purpose: self.purpose,
            extra_text: self.extra_text,
            include_date: self.include_date.unwrap_or(true),
            include_hash: self.include_hash.unwrap_or(true),
        }
    }
}

/// Ask for every open field on `output`, reading answers from `input`.
pub fn collect_fields<R: BufRead, W: Write>(
    overrides: &FieldOverrides,
    mut input: R,
    mut output: W,
) -> io::Result<WatermarkFields> {
    let mut fields = overrides.clone().into_fields();

    if overrides.recipient.is_none() {
        fields.recipient = ask(
            &mut input,
            &mut output,
            "Recipient (e.g. 'Copy for Bank XYZ'): ",
        )?;
    }
    if overrides.purpose.is_none() {
        fields.purpose = ask(
            &mut input,
            &mut output,
            "Purpose (e.g. 'KYC account opening 2025'): ",
        )?;
    }
    if overrides.extra_text.is_none() {
        fields.extra_text = ask(&mut input, &mut output, "Extra text (optional): ")?;
    }
    if overrides.include_date.is_none() {
        let answer = ask(&mut input, &mut output, "Include date? (y/n) [y]: ")?;
        fields.include_date = parse_yes_no(answer.as_deref(), true);
    }
    if overrides.include_hash.is_none() {
        let answer = ask(
            &mut input,
            &mut output,
            "Include SHA-256 of the original? (y/n) [y]: ",
        )?;
        fields.include_hash = parse_yes_no(answer.as_deref(), true);
    }

    Ok(fields)
}

/// Interpret a yes/no answer; blank or unrecognised answers keep `default`.
pub fn parse_yes_no(answer: Option<&str>, default: bool) -> bool {
    match answer.map(|a| a.trim().to_lowercase()).as_deref() {
        Some("n") | Some("no") => false,
        Some("y") | Some("yes") | Some("s") | Some("si") | Some("sí") => true,
        _ => default,
    }
}

/// Print `label` and read one trimmed line. `None` on EOF or blank answer.
fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(None);
    }

    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}
