use image::DynamicImage;
use qrcraft::content::{
    ContentPayload, ContentType, EmailData, VCardData, VEventData, WhatsAppData, WifiData,
};
use qrcraft::display::{format_display_content, format_display_for_tag};
use qrcraft::history::{History, HistoryStore, QrCodeData, MAX_HISTORY_ITEMS};
use qrcraft::render::generate_image_buffer;
use qrcraft::scan::decode_image;
use qrcraft::settings::{ErrorCorrection, FrameSettings, FrameType, QrCodeSettings};

#[test]
fn wifi_label_recovers_fields() {
    let payload = ContentPayload::Wifi(WifiData {
        ssid: "Lab 5G".into(),
        password: "pa55".into(),
        encryption: "WPA".into(),
        hidden: true,
    });
    let data = QrCodeData::new(&payload, &QrCodeSettings::default());
    assert_eq!(data.display_content, "Wi-Fi: Lab 5G (WPA, Hidden)");
}

#[test]
fn vcard_without_org_shows_full_name() {
    let payload = ContentPayload::Vcard(VCardData {
        first_name: "Katherine".into(),
        last_name: "Johnson".into(),
        phone: "+1 555 0100".into(),
        ..Default::default()
    });
    let content = payload.encode();
    assert_eq!(
        format_display_content(&content, ContentType::Vcard),
        "Contact: Katherine Johnson"
    );
}

#[test]
fn vevent_start_formats() {
    let all_day = ContentPayload::Vevent(VEventData {
        start_date: "2024-01-15".into(),
        all_day: true,
        ..Default::default()
    });
    assert!(all_day.encode().lines().any(|line| line == "DTSTART:20240115"));

    let timed = ContentPayload::Vevent(VEventData {
        start_date: "2024-01-15".into(),
        start_time: "14:30".into(),
        ..Default::default()
    });
    assert!(timed.encode().lines().any(|line| line == "DTSTART:20240115T143000"));
}

#[test]
fn bare_email_has_no_query() {
    let payload = ContentPayload::Email(EmailData {
        to: "hello@example.com".into(),
        ..Default::default()
    });
    assert_eq!(payload.encode(), "mailto:hello@example.com");
}

#[test]
fn whatsapp_message_is_encoded_and_number_recovered() {
    let payload = ContentPayload::Whatsapp(WhatsAppData {
        to: "447700900123".into(),
        message: "table for two".into(),
    });
    let content = payload.encode();
    assert_eq!(content, "https://wa.me/447700900123?text=table%20for%20two");
    assert_eq!(
        format_display_content(&content, ContentType::Whatsapp),
        "WhatsApp: 447700900123"
    );
}

#[test]
fn unknown_type_label_is_identity() {
    let raw = "BEGIN:SOMETHING;ELSE";
    assert_eq!(format_display_for_tag(raw, "mecard"), raw);
}

#[test]
fn history_keeps_ten_newest_and_replaces_duplicates() {
    let settings = QrCodeSettings::default();
    let mut history = History::new();
    for i in 0..11 {
        let mut data = QrCodeData::from_content(format!("item {i}"), ContentType::Text, &settings);
        data.id = format!("id-{i}");
        history.add(data);
    }
    assert_eq!(history.len(), MAX_HISTORY_ITEMS);
    assert_eq!(history.items()[0].id, "id-10");
    assert!(history.get("id-0").is_none());

    let mut repeat = QrCodeData::from_content("again", ContentType::Text, &settings);
    repeat.id = "id-4".into();
    history.add(repeat);
    assert_eq!(history.len(), MAX_HISTORY_ITEMS);
    assert_eq!(history.items()[0].content, "again");
    assert_eq!(history.items().iter().filter(|d| d.id == "id-4").count(), 1);
}

#[test]
fn history_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = HistoryStore::new(dir.path().join("history.json"));
    let settings = QrCodeSettings {
        error_correction: ErrorCorrection::H,
        frame: FrameSettings {
            kind: FrameType::Rounded,
            text: "Scan me".into(),
        },
        ..Default::default()
    };
    let data = QrCodeData::new(&ContentPayload::Url("https://example.com".into()), &settings);
    store.update(|history| history.add(data.clone())).unwrap();

    let reloaded = HistoryStore::new(store.path()).load().unwrap();
    assert_eq!(reloaded.items(), [data]);
}

#[test]
fn styled_code_scans_back() {
    let settings = QrCodeSettings {
        size: 400,
        error_correction: ErrorCorrection::Q,
        frame: FrameSettings {
            kind: FrameType::Square,
            text: "Menu".into(),
        },
        ..Default::default()
    };
    let content = ContentPayload::Email(EmailData {
        to: "orders@example.com".into(),
        subject: "Table 4".into(),
        body: String::new(),
    })
    .encode();

    let img = generate_image_buffer(&content, &settings).unwrap();
    let results = decode_image(&DynamicImage::ImageRgba8(img)).unwrap();
    assert_eq!(results[0].content, content);
    assert_eq!(results[0].display_content, "Email: orders@example.com");
}
