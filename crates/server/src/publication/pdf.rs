//! Timetable PDF rendering with `lopdf`.
//!
//! Output is a plain A4 text listing: title, promotion, week span and one
//! line per session. Text uses the standard Helvetica font, so characters
//! outside Latin-1 are replaced with `?`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::types::PublicationContext;

/// Display format for dates in mails and PDFs.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 50;
const TOP: i64 = 790;
const LEADING: i64 = 15;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 10;
pub const LINES_PER_PAGE: usize = 48;

/// Text lines of the document, in order.
pub fn layout_lines(ctx: &PublicationContext) -> Vec<String> {
    let mut lines = Vec::with_capacity(ctx.sessions.len() + 5);

    lines.push(
        ctx.timetable
            .title
            .clone()
            .unwrap_or_else(|| format!("Timetable {}", ctx.promotion.name)),
    );
    lines.push(format!("Promotion: {}", ctx.promotion.name));
    match &ctx.week {
        Some(week) => lines.push(format!(
            "Week {}: {} to {}",
            week.sequence_number,
            week.start_date.format(DATE_FORMAT),
            week.end_date.format(DATE_FORMAT)
        )),
        None => lines.push("Week: not assigned".to_string()),
    }
    lines.push(String::new());

    if ctx.sessions.is_empty() {
        lines.push("No sessions scheduled.".to_string());
    }

    for s in &ctx.sessions {
        let mut line = format!(
            "{} {}  {}-{}  {}",
            s.session_date.format("%a"),
            s.session_date.format(DATE_FORMAT),
            s.start_time.format("%H:%M"),
            s.end_time.format("%H:%M"),
            s.course_name
        );
        if let Some(code) = &s.course_code {
            line.push_str(&format!(" ({code})"));
        }
        if let Some(room) = &s.classroom_name {
            line.push_str(&format!("  room {room}"));
        }
        if let Some(teacher) = &s.teacher_name {
            line.push_str(&format!("  {teacher}"));
        }
        lines.push(line);
    }

    lines
}

/// Render the timetable as PDF bytes.
pub fn render_timetable_pdf(ctx: &PublicationContext) -> Result<Vec<u8>, lopdf::Error> {
    let lines = layout_lines(ctx);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids: Vec<ObjectId> = Vec::new();
    for (page_index, chunk) in lines.chunks(LINES_PER_PAGE).enumerate() {
        let mut operations = Vec::with_capacity(chunk.len() * 5);
        for (i, text) in chunk.iter().enumerate() {
            let size = if page_index == 0 && i == 0 { TITLE_SIZE } else { BODY_SIZE };
            let y = TOP - LEADING * i as i64;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), Object::Integer(size)]));
            operations.push(Operation::new(
                "Td",
                vec![Object::Integer(MARGIN_LEFT), Object::Integer(y)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        "Count" => Object::Integer(page_ids.len() as i64),
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buf = Vec::new();
    doc.save_to(&mut buf)?;
    Ok(buf)
}

/// Encode text for the WinAnsiEncoding Helvetica font. Characters the
/// encoding cannot draw become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        // C1 controls share those byte values in WinAnsi.
        '\u{0080}'..='\u{009F}' => b'?',
        _ => u8::try_from(u32::from(c)).unwrap_or(b'?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publication::types::{PromotionRow, SessionLine, StudentRow, TimetableRow};
    use crate::weeks::AcademicWeek;
    use chrono::{NaiveDate, NaiveTime};
    use uuid::Uuid;

    fn context(session_count: usize) -> PublicationContext {
        let promotion_id = Uuid::new_v4();
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        PublicationContext {
            timetable: TimetableRow {
                id: Uuid::new_v4(),
                promotion_id,
                week_id: None,
                title: None,
                status: "published".to_string(),
                published_at: None,
            },
            promotion: PromotionRow {
                id: promotion_id,
                name: "M1 Informatique".to_string(),
                delegate_id: None,
            },
            delegate: Some(StudentRow {
                id: Uuid::new_v4(),
                first_name: "Camille".to_string(),
                last_name: "Durand".to_string(),
                email: Some("camille@example.com".to_string()),
            }),
            week: Some(AcademicWeek {
                id: Uuid::new_v4(),
                sequence_number: 1,
                start_date: day,
                end_date: NaiveDate::from_ymd_opt(2025, 9, 7).unwrap(),
                year: 2025,
                is_current: false,
            }),
            sessions: (0..session_count)
                .map(|i| SessionLine {
                    session_date: day,
                    start_time: NaiveTime::from_hms_opt(8, 30, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                    course_name: format!("Course {i}"),
                    course_code: Some("ALG".to_string()),
                    teacher_name: Some("M. Martin".to_string()),
                    classroom_name: Some("B204".to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn layout_has_header_and_one_line_per_session() {
        let lines = layout_lines(&context(2));
        assert_eq!(lines[0], "Timetable M1 Informatique");
        assert_eq!(lines[1], "Promotion: M1 Informatique");
        assert_eq!(lines[2], "Week 1: 01/09/2025 to 07/09/2025");
        assert_eq!(lines.len(), 4 + 2);
        assert_eq!(
            lines[4],
            "Mon 01/09/2025  08:30-10:00  Course 0 (ALG)  room B204  M. Martin"
        );
    }

    #[test]
    fn layout_without_week_or_sessions() {
        let mut ctx = context(0);
        ctx.week = None;
        ctx.timetable.title = Some("Semestre 1".to_string());
        let lines = layout_lines(&ctx);
        assert_eq!(lines[0], "Semestre 1");
        assert_eq!(lines[2], "Week: not assigned");
        assert_eq!(lines.last().map(String::as_str), Some("No sessions scheduled."));
    }

    #[test]
    fn renders_a_loadable_pdf() {
        let bytes = render_timetable_pdf(&context(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn long_timetables_paginate() {
        let bytes = render_timetable_pdf(&context(60)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        // 4 header lines + 60 sessions over 48-line pages.
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn text_is_encoded_for_win_ansi() {
        assert_eq!(win_ansi("Élève"), b"\xC9l\xE8ve".to_vec());
        assert_eq!(
            win_ansi("Cours d\u{2019}économie, S\u{153}ur, 5\u{20AC}"),
            b"Cours d\x92\xE9conomie, S\x9Cur, 5\x80".to_vec()
        );
        assert_eq!(win_ansi("8h\u{2013}10h \u{2026}"), b"8h\x9610h \x85".to_vec());
        assert_eq!(win_ansi("\u{0092}"), b"?".to_vec());
        assert_eq!(win_ansi("日"), b"?".to_vec());
    }
}
