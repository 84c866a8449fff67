//! Table-driven entity extraction.
//!
//! Every extractor is a row of [`ExtractorTable`]: a target [`Field`] and a
//! [`Matcher`] (compiled regex + normalizer, alias lexicon, or a custom
//! function). The standard table is compiled once and shared. Rows for the
//! same field are tried in table order; the first hit wins.
//!
//! All matchers see text that went through [`normalize_text`], so patterns
//! and lexicon entries are written in normalized spelling (plain alef,
//! ASCII digits, lowercase latin).

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use shipchat_core::{EntityBag, EntityValue, Field};

use crate::normalize::{clean_text, normalize_text};

/// Turns the captures of a pattern row into a value.
pub type Normalizer = fn(&Captures<'_>) -> Option<EntityValue>;

/// How a row finds its value in normalized text.
pub enum Matcher {
    /// First regex match, converted by `normalize`.
    Pattern { regex: Regex, normalize: Normalizer },
    /// First alias (in table order) contained in the text maps to its
    /// canonical value; `default` applies when nothing matches.
    Lexicon {
        entries: Vec<(String, &'static str)>,
        default: Option<&'static str>,
    },
    /// Extraction that needs more than one regex or token-level logic.
    Custom(fn(&str) -> Option<EntityValue>),
}

/// One row of the extractor table.
pub struct ExtractorRule {
    pub field: Field,
    matcher: Matcher,
}

impl ExtractorRule {
    pub fn pattern(field: Field, pattern: &str, normalize: Normalizer) -> Self {
        Self {
            field,
            matcher: Matcher::Pattern {
                regex: Regex::new(pattern).expect("Invalid extractor regex"),
                normalize,
            },
        }
    }

    pub fn lexicon(
        field: Field,
        entries: &[(&str, &'static str)],
        default: Option<&'static str>,
    ) -> Self {
        let entries = entries
            .iter()
            .map(|(alias, canonical)| (normalize_text(alias), *canonical))
            .collect();
        Self {
            field,
            matcher: Matcher::Lexicon { entries, default },
        }
    }

    pub fn custom(field: Field, extract: fn(&str) -> Option<EntityValue>) -> Self {
        Self {
            field,
            matcher: Matcher::Custom(extract),
        }
    }

    /// Apply the row to already-normalized text.
    pub fn apply(&self, normalized: &str) -> Option<EntityValue> {
        match &self.matcher {
            Matcher::Pattern { regex, normalize } => {
                regex.captures(normalized).and_then(|caps| normalize(&caps))
            }
            Matcher::Lexicon { entries, default } => entries
                .iter()
                .find(|(alias, _)| normalized.contains(alias.as_str()))
                .map(|(_, canonical)| EntityValue::text(*canonical))
                .or_else(|| default.map(EntityValue::text)),
            Matcher::Custom(extract) => extract(normalized),
        }
    }
}

/// Ordered collection of extractor rows.
pub struct ExtractorTable {
    rules: Vec<ExtractorRule>,
}

static STANDARD_TABLE: LazyLock<ExtractorTable> = LazyLock::new(ExtractorTable::build_standard);

impl ExtractorTable {
    pub fn new(rules: Vec<ExtractorRule>) -> Self {
        Self { rules }
    }

    /// The shared table with every built-in extractor.
    pub fn standard() -> &'static ExtractorTable {
        &STANDARD_TABLE
    }

    pub fn rules(&self) -> &[ExtractorRule] {
        &self.rules
    }

    /// Extract a single field from raw text.
    pub fn extract_field(&self, field: Field, text: &str) -> Option<EntityValue> {
        self.extract_normalized(field, &normalize_text(text))
    }

    /// Run the extractors for `fields` (duplicates ignored) over raw text.
    pub fn extract(&self, text: &str, fields: &[Field]) -> EntityBag {
        let normalized = normalize_text(text);
        let mut bag = EntityBag::new();
        for field in fields {
            if bag.contains(*field) {
                continue;
            }
            if let Some(value) = self.extract_normalized(*field, &normalized) {
                bag.insert(*field, value);
            }
        }
        bag
    }

    fn extract_normalized(&self, field: Field, normalized: &str) -> Option<EntityValue> {
        self.rules
            .iter()
            .filter(|rule| rule.field == field)
            .find_map(|rule| rule.apply(normalized))
    }

    fn build_standard() -> Self {
        Self::new(vec![
            ExtractorRule::custom(Field::ReceiverPhone, phone_entity),
            ExtractorRule::lexicon(Field::City, CITY_GAZETTEER, None),
            ExtractorRule::pattern(
                Field::Weight,
                r"([0-9]+(?:\.[0-9]+)?)\s?(كيلوغرام|كيلوجرام|كيلو|كجم|كغ|kg|kilo|جرام|غرام)",
                weight_value,
            ),
            ExtractorRule::pattern(
                Field::Price,
                r"([0-9]+(?:\.[0-9]+)?)\s?(?:ريال|ر\.س|sar\b|sr\b)",
                number_value,
            ),
            ExtractorRule::custom(Field::ReceiverName, name_after_cue),
            ExtractorRule::custom(Field::ReceiverName, first_name_pair),
            ExtractorRule::pattern(
                Field::Email,
                r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}",
                whole_match,
            ),
            ExtractorRule::lexicon(Field::Company, COMPANY_ALIASES, None),
            ExtractorRule::pattern(Field::TrackingNumber, r"[0-9]{8,}", whole_match),
            ExtractorRule::pattern(
                Field::ShipmentId,
                r"(?:رقم الشحنة|رقم|#|id)\s*:?\s*([0-9]{3,})",
                first_group,
            ),
            ExtractorRule::pattern(Field::ShipmentId, r"[0-9]{4,}", whole_match),
            ExtractorRule::custom(Field::Address, address_after_cue),
            ExtractorRule::custom(Field::Address, address_from_district),
            ExtractorRule::lexicon(Field::PaymentMethod, PAYMENT_BUCKETS, None),
            // The `standard` default lives in `extract_shipment_type`, not here.
            ExtractorRule::lexicon(Field::ShipmentType, SHIPMENT_TYPE_BUCKETS, None),
            ExtractorRule::custom(Field::SearchTerm, search_term),
        ])
    }
}

// =============================================================================
// Lexicons
// =============================================================================

/// Saudi cities, most specific spelling first. Canonical names are returned.
pub const CITY_GAZETTEER: &[(&str, &str)] = &[
    ("الرياض", "الرياض"),
    ("جدة", "جدة"),
    ("جده", "جدة"),
    ("مكة المكرمة", "مكة المكرمة"),
    ("مكة", "مكة المكرمة"),
    ("المدينة المنورة", "المدينة المنورة"),
    ("الدمام", "الدمام"),
    ("الخبر", "الخبر"),
    ("الظهران", "الظهران"),
    ("الطائف", "الطائف"),
    ("تبوك", "تبوك"),
    ("بريدة", "بريدة"),
    ("عنيزة", "عنيزة"),
    ("خميس مشيط", "خميس مشيط"),
    ("أبها", "أبها"),
    ("حائل", "حائل"),
    ("نجران", "نجران"),
    ("جازان", "جازان"),
    ("جيزان", "جازان"),
    ("ينبع", "ينبع"),
    ("الجبيل", "الجبيل"),
    ("الأحساء", "الأحساء"),
    ("الهفوف", "الهفوف"),
    ("القطيف", "القطيف"),
    ("الباحة", "الباحة"),
    ("عرعر", "عرعر"),
    ("سكاكا", "سكاكا"),
    ("حفر الباطن", "حفر الباطن"),
    ("الخرج", "الخرج"),
    ("المدينة", "المدينة المنورة"),
];

pub const COMPANY_ALIASES: &[(&str, &str)] = &[
    ("سمسا", "smsa"),
    ("smsa", "smsa"),
    ("أرامكس", "aramex"),
    ("aramex", "aramex"),
    ("دي اتش ال", "dhl"),
    ("dhl", "dhl"),
    ("فيدكس", "fedex"),
    ("فيديكس", "fedex"),
    ("fedex", "fedex"),
    ("ناقل", "naqel"),
    ("naqel", "naqel"),
    ("زاجل", "zajil"),
    ("zajil", "zajil"),
    ("البريد السعودي", "spl"),
    ("سبل", "spl"),
];

pub const PAYMENT_BUCKETS: &[(&str, &str)] = &[
    ("الدفع عند الاستلام", "cash_on_delivery"),
    ("عند الاستلام", "cash_on_delivery"),
    ("كاش", "cash_on_delivery"),
    ("نقدا", "cash_on_delivery"),
    ("cash on delivery", "cash_on_delivery"),
    ("cod", "cash_on_delivery"),
    ("مدفوع مسبقا", "prepaid"),
    ("مسبق", "prepaid"),
    ("prepaid", "prepaid"),
    ("بطاقة", "card"),
    ("مدى", "card"),
    ("فيزا", "card"),
    ("card", "card"),
];

pub const SHIPMENT_TYPE_BUCKETS: &[(&str, &str)] = &[
    ("نفس اليوم", "same_day"),
    ("same day", "same_day"),
    ("مستعجل", "express"),
    ("عاجل", "express"),
    ("سريع", "express"),
    ("express", "express"),
    ("اقتصادي", "economy"),
    ("economy", "economy"),
];

/// Words that never form part of a receiver name on their own.
const NAME_STOPWORDS: &[&str] = &[
    "انشئ", "انشاء", "اريد", "ابغى", "ابي", "ارسل", "ارسال", "شحنة", "شحنه", "الشحنة", "شحنتي",
    "شحناتي", "الشحنات", "جديدة", "جديد", "تتبع", "وين", "اين", "الغاء", "الغي", "ابحث", "بحث",
    "طلباتي", "الطلبات", "طلب", "ملفي", "حسابي", "الملف", "الشخصي", "مرحبا", "اهلا", "السلام",
    "عليكم", "شكرا", "مشكور", "مساعدة", "ساعدني", "الوزن", "وزن", "كيلو", "جرام", "غرام", "كجم",
    "ريال", "رقم", "الجوال", "جوال", "هاتف", "الهاتف", "المدينة", "مدينة", "العنوان", "عنوان",
    "حي", "شارع", "طريق", "الى", "من", "في", "على", "عن", "مع", "هو", "هي", "اسم", "الاسم",
    "اسمه", "المستلم", "للمستلم", "سعر", "كم", "تكلفة", "الدفع", "عند", "الاستلام", "سريع",
    "عادي", "مستعجل", "نفس", "اليوم", "لو", "سمحت", "ابغا", "عندي", "شركة", "الشركة", "حالة",
];

static NAME_STOP_SET: LazyLock<HashSet<String>> = LazyLock::new(|| {
    let mut set: HashSet<String> = NAME_STOPWORDS.iter().map(|w| normalize_text(w)).collect();
    for (alias, _) in CITY_GAZETTEER.iter().chain(COMPANY_ALIASES) {
        for word in normalize_text(alias).split_whitespace() {
            set.insert(word.to_string());
        }
    }
    set
});

// =============================================================================
// Normalizers and custom extractors
// =============================================================================

fn whole_match(caps: &Captures<'_>) -> Option<EntityValue> {
    caps.get(0).map(|m| EntityValue::text(m.as_str()))
}

fn first_group(caps: &Captures<'_>) -> Option<EntityValue> {
    caps.get(1).map(|m| EntityValue::text(m.as_str()))
}

fn number_value(caps: &Captures<'_>) -> Option<EntityValue> {
    caps.get(1)?.as_str().parse().ok().map(EntityValue::Number)
}

fn weight_value(caps: &Captures<'_>) -> Option<EntityValue> {
    let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
    let kilograms = match caps.get(2)?.as_str() {
        "جرام" | "غرام" => amount / 1000.0,
        _ => amount,
    };
    Some(EntityValue::Number(kilograms))
}

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+?966[\s-]?|0)?5[0-9]{8}").expect("Invalid phone regex"));

fn phone_entity(text: &str) -> Option<EntityValue> {
    PHONE_RE
        .find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(|c| c.is_ascii_digit()) && !after.is_some_and(|c| c.is_ascii_digit())
        })
        .find_map(|m| normalize_phone(m.as_str()))
        .map(EntityValue::Text)
}

/// Normalize a Saudi mobile number to `05XXXXXXXX`.
///
/// Accepts `+966 5XXXXXXXX`, `966 5XXXXXXXX`, `05XXXXXXXX` and `5XXXXXXXX`
/// (spaces and dashes ignored). Idempotent on its own output.
pub fn normalize_phone(input: &str) -> Option<String> {
    let digits: String = normalize_text(input)
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let local = digits
        .strip_prefix("00966")
        .or_else(|| digits.strip_prefix("966"))
        .unwrap_or(&digits);
    let local = local.strip_prefix('0').unwrap_or(local);
    if local.len() == 9 && local.starts_with('5') {
        Some(format!("0{}", local))
    } else {
        None
    }
}

fn is_arabic_letter(c: char) -> bool {
    ('\u{0621}'..='\u{064A}').contains(&c)
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_name_token(token: &str) -> bool {
    token.chars().count() >= 2
        && token.chars().all(is_arabic_letter)
        && !NAME_STOP_SET.contains(token)
}

static NAME_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:اسم المستلم|اسم المرسل اليه|الاسم|اسمه|للمستلم|المستلم|name)\s*:?\s*(\S+)(?:\s+(\S+))?")
        .expect("Invalid name cue regex")
});

fn name_after_cue(text: &str) -> Option<EntityValue> {
    let caps = NAME_CUE_RE.captures(text)?;
    let accept = |t: &str| {
        !t.is_empty() && t.chars().all(char::is_alphabetic) && !NAME_STOP_SET.contains(t)
    };
    let first = trim_token(caps.get(1)?.as_str());
    if !accept(first) {
        return None;
    }
    match caps.get(2).map(|m| trim_token(m.as_str())) {
        Some(second) if accept(second) => Some(EntityValue::Text(format!("{} {}", first, second))),
        _ => Some(EntityValue::text(first)),
    }
}

/// First run of two consecutive Arabic word tokens that are not command,
/// city or address vocabulary. Spans claimed by the address extractors are
/// skipped, so street names never become a receiver name.
fn first_name_pair(text: &str) -> Option<EntityValue> {
    let outside_address = strip_address_spans(text);
    let tokens: Vec<&str> = outside_address
        .split_whitespace()
        .map(trim_token)
        .collect();
    tokens
        .windows(2)
        .find(|pair| is_name_token(pair[0]) && is_name_token(pair[1]))
        .map(|pair| EntityValue::Text(format!("{} {}", pair[0], pair[1])))
}

static ADDRESS_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:العنوان|عنوان|address)\s*:?\s*([^,\n]+)").expect("Invalid address regex")
});

static DISTRICT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)((?:حي|شارع|طريق|street|district)\s+[^,\n]+)")
        .expect("Invalid district regex")
});

const ADDRESS_STOP_TOKENS: &[&str] = &[
    "الوزن", "وزن", "جوال", "الجوال", "رقم", "هاتف", "الهاتف", "الاسم", "اسم", "المستلم",
];

/// Cut an address capture before phone numbers or the next labelled slot.
fn trim_address_tail(raw: &str) -> Option<String> {
    let kept: Vec<&str> = raw
        .split_whitespace()
        .take_while(|token| {
            let bare = trim_token(token);
            let long_number = bare.len() >= 7 && bare.chars().all(|c| c.is_ascii_digit());
            !long_number && !token.starts_with('+') && !ADDRESS_STOP_TOKENS.contains(&bare)
        })
        .collect();
    let address = kept.join(" ");
    let address = address.trim_matches(|c: char| c == ':' || c == '-' || c.is_whitespace());
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

fn strip_address_spans(text: &str) -> String {
    let text = ADDRESS_CUE_RE.replace_all(text, " ");
    DISTRICT_RE.replace_all(&text, " ").into_owned()
}

fn address_after_cue(text: &str) -> Option<EntityValue> {
    let caps = ADDRESS_CUE_RE.captures(text)?;
    trim_address_tail(caps.get(1)?.as_str()).map(EntityValue::Text)
}

fn address_from_district(text: &str) -> Option<EntityValue> {
    let caps = DISTRICT_RE.captures(text)?;
    trim_address_tail(caps.get(1)?.as_str()).map(EntityValue::Text)
}

static SEARCH_CUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:ابحث عن|بحث عن|ابحث|بحث|search for|search|find)\s+(.+)")
        .expect("Invalid search regex")
});

fn search_term(text: &str) -> Option<EntityValue> {
    let caps = SEARCH_CUE_RE.captures(text)?;
    let term = clean_text(caps.get(1)?.as_str());
    if term.is_empty() {
        None
    } else {
        Some(EntityValue::Text(term))
    }
}

// =============================================================================
// Typed convenience wrappers
// =============================================================================

fn text_field(field: Field, text: &str) -> Option<String> {
    match ExtractorTable::standard().extract_field(field, text)? {
        EntityValue::Text(s) => Some(s),
        EntityValue::Number(n) => Some(n.to_string()),
    }
}

fn number_field(field: Field, text: &str) -> Option<f64> {
    ExtractorTable::standard()
        .extract_field(field, text)?
        .as_number()
}

pub fn extract_phone(text: &str) -> Option<String> {
    text_field(Field::ReceiverPhone, text)
}

pub fn extract_city(text: &str) -> Option<String> {
    text_field(Field::City, text)
}

/// Weight in kilograms.
pub fn extract_weight(text: &str) -> Option<f64> {
    number_field(Field::Weight, text)
}

/// Price in SAR.
pub fn extract_price(text: &str) -> Option<f64> {
    number_field(Field::Price, text)
}

pub fn extract_name(text: &str) -> Option<String> {
    text_field(Field::ReceiverName, text)
}

pub fn extract_email(text: &str) -> Option<String> {
    text_field(Field::Email, text)
}

pub fn extract_company(text: &str) -> Option<String> {
    text_field(Field::Company, text)
}

pub fn extract_tracking_number(text: &str) -> Option<String> {
    text_field(Field::TrackingNumber, text)
}

pub fn extract_shipment_id(text: &str) -> Option<String> {
    text_field(Field::ShipmentId, text)
}

pub fn extract_address(text: &str) -> Option<String> {
    text_field(Field::Address, text)
}

pub fn extract_payment_method(text: &str) -> Option<String> {
    text_field(Field::PaymentMethod, text)
}

/// Shipment type bucket; `standard` when no keyword matches.
pub fn extract_shipment_type(text: &str) -> String {
    text_field(Field::ShipmentType, text).unwrap_or_else(|| "standard".to_string())
}

pub fn extract_search_term(text: &str) -> Option<String> {
    text_field(Field::SearchTerm, text)
}
