mod common;

use ava::capabilities::ActionPayload;
use ava::llm::MockProvider;
use ava::types::{MIME_CSV, MIME_DOCX, MIME_TEXT, MIME_XLSX};
use ava::{Capability, Element, InboundEvent, NoopEmitter, Reply, ReplyKind, UploadedFile};
use common::{harness, words, Harness};
use rust_xlsxwriter::Workbook;
use std::io::{Cursor, Write};

fn upload(name: &str, mime: &str, bytes: Vec<u8>) -> InboundEvent {
    InboundEvent::Upload(UploadedFile {
        name: name.to_string(),
        mime: mime.to_string(),
        bytes,
    })
}

async fn send(h: &mut Harness, event: InboundEvent) -> Reply {
    h.dispatcher
        .handle(&mut h.session, event, &NoopEmitter)
        .await
        .unwrap()
}

fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut buf = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    buf.into_inner()
}

fn csv_with_rows(rows: usize) -> Vec<u8> {
    let mut csv = String::from("channel,spend,clicks\n");
    for i in 0..rows {
        csv.push_str(&format!("channel{},{}.5,{}\n", i, i * 100, i * 7));
    }
    csv.into_bytes()
}

#[tokio::test]
async fn test_csv_upload_reports_shape_and_table_actions() {
    let mut h = harness(MockProvider::new(), |_| {});
    let reply = send(&mut h, upload("spend.csv", MIME_CSV, csv_with_rows(10))).await;

    assert_eq!(reply.kind, ReplyKind::Normal);
    assert_eq!(
        reply.content,
        "`spend.csv` uploaded. It has 10 rows and 3 columns."
    );
    assert_eq!(reply.action_names(), vec!["Question", "Get Insights", "Upload File"]);
    match &reply.elements[0] {
        Element::Text { name, content } => {
            assert_eq!(name, "Here are the top 5 rows of data:");
            assert!(content.contains("channel4"));
            assert!(!content.contains("channel5"));
        }
        other => panic!("unexpected element {:?}", other),
    }
    assert_eq!(h.session.table.as_ref().map(|t| t.row_count()), Some(10));
}

#[tokio::test]
async fn test_insights_prompt_describes_uploaded_table() {
    let mut h = harness(MockProvider::new().with_text("**Data Description:** ok"), |_| {});
    send(&mut h, upload("spend.csv", MIME_CSV, csv_with_rows(3))).await;

    let reply = send(
        &mut h,
        InboundEvent::action(Capability::GetInsights, ActionPayload::SessionClipboard),
    )
    .await;

    assert_eq!(reply.content, "**Data Description:** ok");
    assert_eq!(reply.action_names(), vec!["Copy", "Save", "Upload File"]);
    let prompt = &h.llm.prompts()[0];
    assert!(prompt.contains("- Number of rows: 3"));
    assert!(prompt.contains("- Column names: channel, spend, clicks"));
    assert!(prompt.contains("spend: float64"));
    assert!(prompt.contains("clicks: int64"));
}

#[tokio::test]
async fn test_question_on_table_uses_csv_text() {
    let mut h = harness(MockProvider::new().with_text("channel2"), |_| {});
    let reply = send(&mut h, upload("spend.csv", MIME_CSV, csv_with_rows(3))).await;

    let question = reply.actions[0].clone();
    assert_eq!(question.capability, Capability::Question);
    send(&mut h, InboundEvent::action(question.capability, question.value)).await;

    let context = h.session.question_context.clone().unwrap();
    assert!(context.starts_with("channel,spend,clicks"));

    let reply = send(&mut h, InboundEvent::message("which channel had most clicks?")).await;
    assert_eq!(reply.content, "channel2");
}

#[tokio::test]
async fn test_xlsx_upload() {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "region").unwrap();
    sheet.write_string(0, 1, "sales").unwrap();
    for row in 1..=4u32 {
        sheet.write_string(row, 0, &format!("r{}", row)).unwrap();
        sheet.write_number(row, 1, f64::from(row) * 10.0).unwrap();
    }
    let bytes = workbook.save_to_buffer().unwrap();

    let mut h = harness(MockProvider::new(), |_| {});
    let reply = send(&mut h, upload("sales.xlsx", MIME_XLSX, bytes)).await;

    assert_eq!(reply.content, "`sales.xlsx` uploaded. It has 4 rows and 2 columns.");
    let table = h.session.table.as_ref().unwrap();
    assert_eq!(table.headers, vec!["region", "sales"]);
    assert_eq!(table.rows[0], vec!["r1", "10"]);
}

#[tokio::test]
async fn test_docx_upload_reports_tokens_and_preview() {
    let long = words(210);
    let mut h = harness(MockProvider::new(), |_| {});
    let reply = send(
        &mut h,
        upload("brief.docx", MIME_DOCX, docx(&["Campaign brief", &long])),
    )
    .await;

    assert!(
        reply.content.starts_with("`brief.docx` uploaded, it contains "),
        "{}",
        reply.content
    );
    assert!(reply.content.contains(
        "You're currently using the gpt-3.5-turbo-16k model which has a token limit of 16,384."
    ));
    assert!(reply.content.ends_with("This is within the token limit."));
    assert_eq!(
        reply.action_names(),
        vec![
            "Question",
            "Summarise",
            "Bulletpoints",
            "Wordcloud",
            "Quotes",
            "Themes",
            "Copy",
            "Save",
            "Upload File"
        ]
    );

    match &reply.elements[0] {
        Element::Text { name, content } => {
            assert_eq!(name, "Here are the first 200 words from the document:");
            let tokens: Vec<&str> = content.split_whitespace().collect();
            assert_eq!(tokens.len(), 200);
            assert_eq!(tokens[0], "Campaign");
            assert_eq!(tokens[199], "word197");
        }
        other => panic!("unexpected element {:?}", other),
    }

    let text = h.session.document_text.as_deref().unwrap();
    assert!(text.starts_with("Campaign brief\nword0"));
    assert_eq!(
        reply.actions[0].value,
        ActionPayload::Text(text.to_string())
    );
}

#[tokio::test]
async fn test_short_text_has_no_preview() {
    let mut h = harness(MockProvider::new(), |_| {});
    let reply = send(
        &mut h,
        upload("note.txt", MIME_TEXT, b"just a short note".to_vec()),
    )
    .await;

    assert!(reply
        .content
        .starts_with("`note.txt` uploaded, it contains 17 characters which is c."));
    assert!(reply.elements.is_empty());
}

#[tokio::test]
async fn test_over_limit_upload_says_so() {
    let mut h = harness(MockProvider::new(), |config| {
        config.token_limits.models.insert("small".into(), 20);
        config.llm.action_model = "small".into();
    });
    let reply = send(
        &mut h,
        upload("long.txt", MIME_TEXT, words(100).into_bytes()),
    )
    .await;

    assert_eq!(reply.kind, ReplyKind::Normal);
    assert!(reply.content.contains("tokens over the limit"));
    assert!(reply.content.contains("token limit of 20."));
}

#[tokio::test]
async fn test_image_upload_passes_through() {
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];
    let mut h = harness(MockProvider::new(), |_| {});
    let reply = send(&mut h, upload("logo.png", "image/png", png.clone())).await;

    assert_eq!(reply.content, "Here's your image:");
    assert_eq!(reply.action_names(), vec!["Save", "Upload File"]);
    match &reply.elements[0] {
        Element::Image { name, mime, bytes } => {
            assert_eq!(name, "logo.png");
            assert_eq!(mime, "image/png");
            assert_eq!(bytes, &png);
        }
        other => panic!("unexpected element {:?}", other),
    }
    assert_eq!(h.session.image.as_ref(), Some(&png));
}

#[tokio::test]
async fn test_unsupported_and_broken_uploads() {
    let mut h = harness(MockProvider::new(), |_| {});

    let reply = send(&mut h, upload("archive.zip", "application/zip", vec![1, 2, 3])).await;
    assert_eq!(reply.kind, ReplyKind::Unsupported);
    assert!(reply.content.contains("application/zip"));

    let reply = send(&mut h, upload("broken.docx", MIME_DOCX, b"not a zip".to_vec())).await;
    assert_eq!(reply.kind, ReplyKind::Unsupported);
    assert!(reply.content.starts_with("Sorry, I couldn't read `broken.docx`"));

    assert!(h.session.document_text.is_none());
    assert_eq!(h.llm.calls(), 0);
}
