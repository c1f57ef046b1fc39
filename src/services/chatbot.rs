//! Support chatbot.
//!
//! Messages that are exactly five digits are order-code lookups answered
//! straight from the database; everything else is forwarded to the
//! generative-language API with a storefront system prompt.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    errors::ServiceError,
    services::{assistant::AssistantClient, orders::OrderService},
};

const SYSTEM_PROMPT: &str = "You are the storefront's support assistant. Answer briefly and \
only about shopping, orders, shipping and returns. If the customer asks about a specific \
order, tell them to send just their five-digit order number.";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatbotRequest {
    #[validate(length(min = 1, max = 2000, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatbotReply {
    pub reply: String,
    /// "orders" for direct order lookups, "assistant" otherwise
    pub source: &'static str,
}

fn as_order_number(message: &str) -> Option<i32> {
    let trimmed = message.trim();
    if trimmed.len() == 5 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        trimmed.parse().ok()
    } else {
        None
    }
}

#[derive(Clone)]
pub struct ChatbotService {
    orders: Arc<OrderService>,
    assistant: Arc<AssistantClient>,
}

impl ChatbotService {
    pub fn new(orders: Arc<OrderService>, assistant: Arc<AssistantClient>) -> Self {
        Self { orders, assistant }
    }

    #[instrument(skip(self, request))]
    pub async fn reply(
        &self,
        customer_id: Uuid,
        request: ChatbotRequest,
    ) -> Result<ChatbotReply, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if let Some(order_number) = as_order_number(&request.message) {
            let reply = match self
                .orders
                .find_by_order_number(customer_id, order_number)
                .await?
            {
                Some(order) => format!(
                    "Order #{} is currently {}. It totals {} {}.",
                    order.order_number, order.status, order.total_amount, order.currency
                ),
                None => format!(
                    "I couldn't find an order #{} on your account. Please check the number.",
                    order_number
                ),
            };
            return Ok(ChatbotReply {
                reply,
                source: "orders",
            });
        }

        let prompt = format!("{}\n\nCustomer: {}", SYSTEM_PROMPT, request.message.trim());
        let reply = self.assistant.generate_reply(&prompt).await?;

        Ok(ChatbotReply {
            reply,
            source: "assistant",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_digit_messages_are_order_lookups() {
        assert_eq!(as_order_number("12345"), Some(12345));
        assert_eq!(as_order_number("  90210 "), Some(90210));
    }

    #[test]
    fn other_messages_go_to_the_assistant() {
        assert_eq!(as_order_number("1234"), None); // four digits
        assert_eq!(as_order_number("123456"), None); // six digits
        assert_eq!(as_order_number("12a45"), None);
        assert_eq!(as_order_number("where is my order 12345?"), None);
        assert_eq!(as_order_number(""), None);
    }
}
