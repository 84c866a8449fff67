//! Natural-language rendering of action outcomes and failures.

use shipchat_core::{ActionOutcome, ActionType};

use crate::error::ActionError;

/// Render a completed action as a reply fragment.
pub fn summarize(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::ShipmentCreated {
            shipment_id,
            tracking_number,
        } => {
            let mut text = "📦 تم إنشاء الشحنة بنجاح!".to_string();
            if let Some(id) = shipment_id {
                text.push_str(&format!("\nرقم الشحنة: {}", id));
            }
            if let Some(number) = tracking_number {
                text.push_str(&format!("\nرقم التتبع: {}", number));
            }
            text
        }
        ActionOutcome::TrackingStatus {
            tracking_number,
            status,
            location,
        } => {
            let mut text = format!(
                "🚚 حالة الشحنة {}: {}",
                tracking_number,
                status.as_deref().unwrap_or("قيد المعالجة")
            );
            if let Some(location) = location {
                text.push_str(&format!("\n📍 الموقع الحالي: {}", location));
            }
            text
        }
        ActionOutcome::ShipmentCancelled { shipment_id } => {
            format!("❌ تم إلغاء الشحنة رقم {} بنجاح.", shipment_id)
        }
        ActionOutcome::ShipmentList { count: 0 } => "📦 لا توجد لديك شحنات حالياً.".to_string(),
        ActionOutcome::ShipmentList { count } => format!("📦 لديك {} شحنات", count),
        ActionOutcome::OrderList { count: 0 } => "🧾 لا توجد لديك طلبات حالياً.".to_string(),
        ActionOutcome::OrderList { count } => format!("🧾 لديك {} طلبات", count),
        ActionOutcome::Profile { name, email, phone } => {
            let lines: Vec<String> = [
                name.as_ref().map(|n| format!("👤 الاسم: {}", n)),
                email.as_ref().map(|e| format!("📧 البريد: {}", e)),
                phone.as_ref().map(|p| format!("📱 الجوال: {}", p)),
            ]
            .into_iter()
            .flatten()
            .collect();
            if lines.is_empty() {
                "👤 تم جلب بيانات حسابك.".to_string()
            } else {
                lines.join("\n")
            }
        }
        ActionOutcome::SearchResults { term, count: 0 } => {
            format!("🔎 لا توجد نتائج لـ \"{}\".", term)
        }
        ActionOutcome::SearchResults { term, count } => {
            format!("🔎 وجدت {} نتيجة لـ \"{}\".", count, term)
        }
    }
}

fn operation_label(action_type: ActionType) -> &'static str {
    match action_type {
        ActionType::CreateShipment => "إنشاء الشحنة",
        ActionType::TrackShipment => "تتبع الشحنة",
        ActionType::CancelShipment => "إلغاء الشحنة",
        ActionType::GetShipments => "جلب شحناتك",
        ActionType::GetOrders => "جلب طلباتك",
        ActionType::GetProfile => "جلب بيانات حسابك",
        ActionType::Search => "إجراء البحث",
        ActionType::Info | ActionType::None => "تنفيذ الطلب",
    }
}

/// Apologetic reply fragment; carries the server's message when present.
pub fn failure_message(action_type: ActionType, err: &ActionError) -> String {
    let mut text = format!("😔 عذراً، تعذر {}.", operation_label(action_type));
    if let Some(message) = err.server_message() {
        text.push_str(&format!(" {}", message));
    }
    text
}
