use serde::Serialize;

/// Structured record pushed to the webhook when an opportunity clears the
/// profit gate. Carries figures only; no credential material.
#[derive(Debug, Clone, Serialize)]
pub struct OpportunityAlert {
    pub profit_lamports: u64,
    pub input_amount: u64,
    pub fee_estimate_lamports: u64,
}

/// Fire-and-forget webhook delivery. Dispatch is detached so it can never
/// delay the trading pipeline; failures are logged and swallowed.
pub struct Notifier {
    http: reqwest::Client,
    webhook_url: Option<String>,
}

impl Notifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn notify(&self, alert: OpportunityAlert) {
        let url = match &self.webhook_url {
            Some(url) => url.clone(),
            None => return,
        };
        let http = self.http.clone();

        tokio::spawn(async move {
            match http.post(&url).json(&alert).send().await {
                Ok(response) if !response.status().is_success() => {
                    log::debug!("Alert delivery returned {}", response.status());
                }
                Ok(_) => {}
                Err(e) => log::debug!("Alert delivery failed: {}", e),
            }
        });
    }
}
