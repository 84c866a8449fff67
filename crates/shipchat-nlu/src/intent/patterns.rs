//! Intent pattern registry.
//!
//! Each [`IntentPattern`] defines both classification weight (its keyword
//! phrases) and slot-filling behavior (required fields, follow-up prompts,
//! response templates) for one intent. The registry is immutable after
//! construction and injected wherever it is needed.

use std::collections::BTreeMap;

use shipchat_core::{Field, Intent};

use crate::normalize::clean_text;

/// Static description of one intent.
#[derive(Debug, Clone)]
pub struct IntentPattern {
    pub intent: Intent,
    /// Keyword phrases, stored in cleaned form.
    pub keywords: Vec<String>,
    /// Slots that must be filled before the intent's action can run.
    pub required_info: Vec<Field>,
    /// Extractors to run when this intent is classified or active.
    pub extracts: Vec<Field>,
    /// Base response templates.
    pub responses: Vec<String>,
    /// Templates used once every required slot is filled.
    pub ready: Vec<String>,
    /// Prompt variants per missing field.
    pub follow_up: BTreeMap<Field, Vec<String>>,
}

impl IntentPattern {
    pub fn new(intent: Intent, keywords: &[&str]) -> Self {
        Self {
            intent,
            keywords: keywords
                .iter()
                .map(|k| clean_text(k))
                .filter(|k| !k.is_empty())
                .collect(),
            required_info: Vec::new(),
            extracts: Vec::new(),
            responses: Vec::new(),
            ready: Vec::new(),
            follow_up: BTreeMap::new(),
        }
    }

    /// Declare required slots. They are also added to the extractor list.
    pub fn requires(mut self, fields: &[Field]) -> Self {
        self.required_info = fields.to_vec();
        for field in fields {
            if !self.extracts.contains(field) {
                self.extracts.push(*field);
            }
        }
        self
    }

    pub fn extracts(mut self, fields: &[Field]) -> Self {
        for field in fields {
            if !self.extracts.contains(field) {
                self.extracts.push(*field);
            }
        }
        self
    }

    pub fn responses(mut self, templates: &[&str]) -> Self {
        self.responses = to_strings(templates);
        self
    }

    pub fn ready(mut self, templates: &[&str]) -> Self {
        self.ready = to_strings(templates);
        self
    }

    pub fn follow_up(mut self, field: Field, prompts: &[&str]) -> Self {
        self.follow_up.insert(field, to_strings(prompts));
        self
    }

    pub fn has_slots(&self) -> bool {
        !self.required_info.is_empty()
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Ordered, immutable set of intent patterns. Definition order is the
/// classification tie-break order.
///
/// Confidence divides by the keyword count, so a pattern with more than
/// three keywords can no longer pass the confidence floor on one hit. Keep
/// entries short stems rather than phrase variants of each other.
#[derive(Debug, Clone)]
pub struct IntentRegistry {
    patterns: Vec<IntentPattern>,
}

impl IntentRegistry {
    pub fn new(patterns: Vec<IntentPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[IntentPattern] {
        &self.patterns
    }

    pub fn get(&self, intent: Intent) -> Option<&IntentPattern> {
        self.patterns.iter().find(|p| p.intent == intent)
    }

    /// Fields whose extractors should run for `intent`.
    pub fn extract_fields(&self, intent: Intent) -> &[Field] {
        self.get(intent).map(|p| p.extracts.as_slice()).unwrap_or(&[])
    }

    /// Slots `intent` needs before dispatch.
    pub fn required_fields(&self, intent: Intent) -> &[Field] {
        self.get(intent)
            .map(|p| p.required_info.as_slice())
            .unwrap_or(&[])
    }

    /// The built-in logistics pattern table.
    pub fn standard() -> Self {
        use Field::*;

        Self::new(vec![
            IntentPattern::new(
                Intent::CreateShipment,
                &["أنشئ", "إنشاء", "create"],
            )
            .requires(&[ReceiverName, ReceiverPhone, City, Address, Weight])
            .extracts(&[Price, PaymentMethod, ShipmentType, Company])
            .responses(&[
                "📦 ممتاز! خلنا ننشئ شحنة جديدة.",
                "📦 تمام، سأساعدك في إنشاء الشحنة.",
                "📦 بكل سرور، لنبدأ بتجهيز شحنتك.",
            ])
            .ready(&[
                "✅ اكتملت بيانات الشحنة، جارٍ إنشاؤها الآن...",
                "✅ وصلتني كل البيانات، أقوم بإنشاء الشحنة.",
            ])
            .follow_up(
                ReceiverName,
                &["👤 ما اسم المستلم؟", "👤 لمن الشحنة؟ أرسل اسم المستلم."],
            )
            .follow_up(
                ReceiverPhone,
                &["📱 ما رقم جوال المستلم؟", "📱 أرسل رقم الجوال بصيغة 05XXXXXXXX."],
            )
            .follow_up(
                City,
                &["🏙️ إلى أي مدينة؟", "🏙️ ما مدينة المستلم؟"],
            )
            .follow_up(
                Address,
                &["📍 ما عنوان المستلم (الحي والشارع)؟", "📍 أرسل العنوان بالتفصيل."],
            )
            .follow_up(
                Weight,
                &["⚖️ كم وزن الشحنة؟ (مثال: 2 كيلو)", "⚖️ ما الوزن التقريبي للشحنة؟"],
            ),
            IntentPattern::new(
                Intent::TrackShipment,
                &["تتبع", "وين شحنتي", "track"],
            )
            .requires(&[TrackingNumber])
            .extracts(&[Company])
            .responses(&[
                "🔍 سأتحقق من حالة شحنتك.",
                "🔍 لنرَ أين وصلت شحنتك.",
            ])
            .ready(&["🔍 جارٍ البحث عن الشحنة..."])
            .follow_up(
                TrackingNumber,
                &["🔢 ما رقم التتبع؟", "🔢 أرسل رقم التتبع (8 أرقام أو أكثر)."],
            ),
            IntentPattern::new(
                Intent::CancelShipment,
                &["إلغاء", "الغي", "cancel"],
            )
            .requires(&[ShipmentId, Company])
            .responses(&["❌ يمكنني إلغاء الشحنة لك.", "❌ حسناً، لنلغِ الشحنة."])
            .ready(&["❌ جارٍ إلغاء الشحنة..."])
            .follow_up(ShipmentId, &["🔢 ما رقم الشحنة المراد إلغاؤها؟"])
            .follow_up(
                Company,
                &["🚚 مع أي شركة شحن؟ (سمسا، أرامكس، ...)", "🚚 ما شركة الشحن؟"],
            ),
            IntentPattern::new(
                Intent::GetShipments,
                &["شحناتي", "الشحنات", "my shipments"],
            )
            .responses(&["📋 هذه شحناتك:", "📋 إليك قائمة شحناتك:"]),
            IntentPattern::new(
                Intent::GetOrders,
                &["طلباتي", "الطلبات", "orders"],
            )
            .responses(&["🧾 هذه طلباتك:", "🧾 إليك طلباتك:"]),
            IntentPattern::new(
                Intent::GetProfile,
                &["ملف", "حساب", "profile"],
            )
            .responses(&["👤 بيانات حسابك:", "👤 هذا ملفك الشخصي:"]),
            IntentPattern::new(Intent::Search, &["ابحث", "بحث", "ابحث عن", "search"])
                .requires(&[SearchTerm])
                .responses(&["🔎 سأبحث لك.", "🔎 لحظة، أبحث الآن."])
                .ready(&["🔎 جارٍ البحث..."])
                .follow_up(SearchTerm, &["🔎 عن ماذا تريد أن أبحث؟"]),
            IntentPattern::new(
                Intent::Pricing,
                &["سعر", "تكلفة", "price"],
            )
            .extracts(&[City, Weight, ShipmentType, Company])
            .responses(&[
                "💰 تعتمد تكلفة الشحن على الوزن والمدينة ونوع الشحن. الشحن العادي داخل المدينة يبدأ من 25 ريال.",
                "💰 الأسعار تبدأ من 25 ريال للشحن العادي، والشحن السريع من 45 ريال.",
            ]),
            IntentPattern::new(
                Intent::Help,
                &["مساعدة", "ساعدني", "help"],
            )
            .responses(&[CAPABILITY_OVERVIEW]),
            IntentPattern::new(
                Intent::Greeting,
                &["مرحبا", "السلام", "hello"],
            )
            .responses(&[
                "👋 أهلاً وسهلاً! كيف أقدر أساعدك اليوم؟",
                "👋 وعليكم السلام! أنا مساعد الشحن، كيف أخدمك؟",
            ]),
            IntentPattern::new(Intent::Thanks, &["شكرا", "مشكور", "thank"])
                .responses(&["🙏 العفو! في الخدمة دائماً.", "🙏 يسعدني مساعدتك!"]),
            IntentPattern::new(Intent::Info, &["معلومات", "about", "info"])
                .responses(&[CAPABILITY_OVERVIEW]),
        ])
    }
}

/// Canned overview of what the assistant can do; the response of last resort.
pub const CAPABILITY_OVERVIEW: &str = "🤖 أنا مساعد الشحن الذكي. أستطيع مساعدتك في:\n\
• 📦 إنشاء شحنة جديدة\n\
• 🔍 تتبع شحنة برقم التتبع\n\
• ❌ إلغاء شحنة\n\
• 📋 عرض شحناتك وطلباتك\n\
• 👤 عرض ملفك الشخصي\n\
• 🔎 البحث في بياناتك\n\
اكتب طلبك وسأتولى الباقي!";
