//! Built-in knowledge catalog.

use super::KnowledgeEntry;
use crate::ticket::TicketCategory;

type RawEntry = (TicketCategory, &'static str, &'static str, &'static [&'static str]);

const BUILTIN: &[RawEntry] = &[
    // Billing
    (
        TicketCategory::Billing,
        "billing_faq.md",
        "For billing inquiries, customers can view their invoices in the account dashboard \
         under 'Billing & Payments'. Payment methods can be updated in the same section.",
        &["invoice", "payment", "billing", "account", "dashboard"],
    ),
    (
        TicketCategory::Billing,
        "refund_policy.md",
        "Refunds are processed within 5-7 business days. Customers must request refunds \
         within 30 days of purchase. Contact billing@company.com for refund requests.",
        &["refund", "return", "money back", "cancel"],
    ),
    (
        TicketCategory::Billing,
        "subscription_management.md",
        "Subscription changes take effect at the next billing cycle. Upgrades are prorated, \
         downgrades take effect at cycle end to avoid partial charges.",
        &["subscription", "upgrade", "downgrade", "plan", "billing cycle"],
    ),
    (
        TicketCategory::Billing,
        "payment_failures.md",
        "Failed payments will retry automatically after 3 days. Update payment method to \
         avoid service interruption. Account may be suspended after 3 failed attempts.",
        &["failed payment", "declined", "card", "suspended", "retry"],
    ),
    // Technical
    (
        TicketCategory::Technical,
        "login_troubleshooting.md",
        "For login issues, first try clearing browser cache and cookies. If problem persists, \
         reset password using 'Forgot Password' link on login page.",
        &["login", "password", "authentication", "cache", "cookies"],
    ),
    (
        TicketCategory::Technical,
        "api_documentation.md",
        "API rate limits are 1000 requests per hour for standard accounts, 5000 for premium. \
         Use exponential backoff for retry logic when hitting rate limits.",
        &["api", "rate limit", "requests", "429", "quota"],
    ),
    (
        TicketCategory::Technical,
        "mobile_troubleshooting.md",
        "Mobile app crashes can often be resolved by updating to the latest version. Force \
         close the app and restart. Clear app cache if issues persist.",
        &["mobile", "app", "crash", "update", "restart"],
    ),
    (
        TicketCategory::Technical,
        "server_status.md",
        "Database connection timeouts indicate high server load. Wait 5-10 minutes and retry. \
         Check status page for ongoing incidents at status.company.com",
        &["timeout", "database", "connection", "server", "status"],
    ),
    (
        TicketCategory::Technical,
        "notification_issues.md",
        "Email notifications may be delayed up to 30 minutes during peak hours. Check spam \
         folder if emails are missing. Verify email address in account settings.",
        &["email", "notification", "spam", "delayed", "missing"],
    ),
    // Security
    (
        TicketCategory::Security,
        "2fa_setup.md",
        "Enable two-factor authentication (2FA) in account security settings. Use \
         authenticator app for best security. SMS backup is available but less secure.",
        &["2fa", "two-factor", "authentication", "security", "authenticator"],
    ),
    (
        TicketCategory::Security,
        "security_incidents.md",
        "Suspicious account activity should be reported immediately. Change password and \
         review recent login history in security settings. Contact security@company.com for \
         urgent issues.",
        &["suspicious", "activity", "breach", "unauthorized", "security"],
    ),
    (
        TicketCategory::Security,
        "password_policy.md",
        "Password requirements: minimum 12 characters, include uppercase, lowercase, numbers, \
         and symbols. Avoid common passwords and personal information.",
        &["password", "requirements", "strong", "secure", "policy"],
    ),
    (
        TicketCategory::Security,
        "data_privacy.md",
        "Data export requests are processed within 48 hours. Submit request through account \
         settings > Privacy > Export Data. Files are available for 7 days.",
        &["data export", "gdpr", "privacy", "download", "personal data"],
    ),
    // General
    (
        TicketCategory::General,
        "account_deletion.md",
        "Account deletion is permanent and cannot be undone. Export your data first. Contact \
         support to initiate deletion process. Allow 30 days for complete removal.",
        &["delete account", "close", "remove", "permanent", "export"],
    ),
    (
        TicketCategory::General,
        "feature_requests.md",
        "Feature requests can be submitted through the feedback form in app settings. Popular \
         requests are reviewed monthly by the product team.",
        &["feature", "request", "suggestion", "feedback", "product"],
    ),
    (
        TicketCategory::General,
        "support_hours.md",
        "Business hours support: Monday-Friday 9AM-6PM EST. Premium customers have 24/7 phone \
         support. Response time: 4 hours for urgent, 24 hours for normal.",
        &["support", "hours", "contact", "response time", "urgent"],
    ),
    (
        TicketCategory::General,
        "profile_management.md",
        "Account information updates (name, email, phone) can be made in profile settings. \
         Email changes require verification. Some changes may require identity verification.",
        &["profile", "update", "personal", "information", "verification"],
    ),
];

/// Entries of the built-in catalog, in catalog order.
pub fn builtin_entries() -> Vec<KnowledgeEntry> {
    BUILTIN
        .iter()
        .map(|(category, source, content, keywords)| KnowledgeEntry {
            category: *category,
            content: (*content).to_string(),
            source: (*source).to_string(),
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        })
        .collect()
}
