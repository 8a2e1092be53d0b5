//! Example of building, encoding and decoding a message board archive

use textarchive::{Decoder, Document, Encoder, FieldValue, Section, Validator};

fn main() -> anyhow::Result<()> {
    println!("=== Archive Round Trip Example ===\n");

    let mut service = Section::new();
    service.set_text("Entry", "1");
    service.set_text("Service", "Example Board");
    service.set_text("Info", "Generated by the roundtrip example.\n\nExport of a test board.");

    let mut category = Section::new();
    category.set_text("Kind", "Categories, Category");
    category.set_text("ID", "1");
    category.set_text("InSub", "0");
    category.set_text("Headline", "General");
    service.push_section("Category List", category);

    let mut thread = Section::new();
    thread.set_text("Thread", "1");
    thread.set_text("Title", "Welcome");
    for (number, body) in [("1", "Hello there."), ("2", "Hi!\nGood to be here.")] {
        let mut post = Section::new();
        post.set_text("Post", number);
        post.insert("Message", FieldValue::MultiLineText(body.to_string()));
        thread.push_section("Message Post", post);
    }
    let mut messages = Section::new();
    messages.push_section("Message Thread", thread);
    service.push_section("Message List", messages);

    let mut document = Document::new();
    document.push_section("Archive Service", service);

    let encoded = Encoder::new().encode(&document)?;
    println!("Encoded archive:");
    println!("---");
    print!("{}", encoded);
    println!("---");

    let parsed = Decoder::new().decode(&encoded);
    println!("\nDecoded {} top-level section(s), {} diagnostic(s)", parsed.document.section_count(), parsed.diagnostics.len());

    let findings = Validator::new().validate(&parsed.document);
    for finding in &findings {
        println!("  {}", finding);
    }

    assert!(parsed.diagnostics.is_empty());
    assert_eq!(parsed.document, document);
    assert_eq!(Encoder::new().encode(&parsed.document)?, encoded);

    println!("\nRound-trip verification passed!");

    Ok(())
}
