//! Built-in detection patterns.
//!
//! Within a priority level, table order is evaluation order, so the more
//! specific shapes come first (a JWT segment must not be claimed by the
//! generic 40-character AWS secret pattern).

use crate::pattern::{Pattern, PatternSpec, Priority};
use once_cell::sync::Lazy;

/// Static definition of a built-in pattern.
struct BuiltinPattern {
    name: &'static str,
    regex: &'static str,
    category: &'static str,
    priority: u8,
    capture_group: usize,
    exclude: Option<&'static str>,
    description: &'static str,
}

const fn builtin(
    name: &'static str,
    regex: &'static str,
    category: &'static str,
    priority: u8,
    description: &'static str,
) -> BuiltinPattern {
    BuiltinPattern {
        name,
        regex,
        category,
        priority,
        capture_group: 0,
        exclude: None,
        description,
    }
}

const fn captured(mut pattern: BuiltinPattern, group: usize) -> BuiltinPattern {
    pattern.capture_group = group;
    pattern
}

const fn excluding(mut pattern: BuiltinPattern, exclude: &'static str) -> BuiltinPattern {
    pattern.exclude = Some(exclude);
    pattern
}

static BUILTINS: &[BuiltinPattern] = &[
    // Cloud provider and SaaS credentials
    builtin(
        "aws_access_key",
        r"AKIA[0-9A-Z]{16}",
        "AWS_KEY",
        Priority::CRITICAL,
        "AWS Access Key ID",
    ),
    builtin(
        "aws_session_token",
        r"FwoGZX[A-Za-z0-9/+=]{100,}",
        "AWS_TOKEN",
        Priority::CRITICAL,
        "AWS Session Token",
    ),
    builtin(
        "github_token",
        r"gh[pousr]_[A-Za-z0-9_]{36,255}",
        "GITHUB_TOKEN",
        Priority::CRITICAL,
        "GitHub Personal Access Token",
    ),
    builtin(
        "github_oauth",
        r"gho_[A-Za-z0-9]{36}",
        "GITHUB_TOKEN",
        Priority::CRITICAL,
        "GitHub OAuth Token",
    ),
    builtin(
        "gitlab_token",
        r"glpat-[A-Za-z0-9_\-]{20,}",
        "GITLAB_TOKEN",
        Priority::CRITICAL,
        "GitLab Personal Access Token",
    ),
    builtin(
        "slack_token",
        r"xox[baprs]-[A-Za-z0-9\-]{10,}",
        "SLACK_TOKEN",
        Priority::CRITICAL,
        "Slack Token",
    ),
    builtin(
        "slack_webhook",
        r"https://hooks\.slack\.com/services/T[A-Z0-9]+/B[A-Z0-9]+/[A-Za-z0-9]+",
        "SLACK_WEBHOOK",
        Priority::CRITICAL,
        "Slack Webhook URL",
    ),
    builtin(
        "discord_webhook",
        r"https://discord(?:app)?\.com/api/webhooks/[0-9]+/[A-Za-z0-9_\-]+",
        "DISCORD_WEBHOOK",
        Priority::CRITICAL,
        "Discord Webhook URL",
    ),
    builtin(
        "private_key_block",
        r"-----BEGIN\s+(?:[A-Z]+\s+)*PRIVATE\s+KEY-----[\s\S]*?-----END\s+(?:[A-Z]+\s+)*PRIVATE\s+KEY-----",
        "PRIVATE_KEY",
        Priority::CRITICAL,
        "Private Key (PEM)",
    ),
    builtin(
        "azure_connection_string",
        r"(?i)DefaultEndpointsProtocol=https?;AccountName=[^;\s]+;AccountKey=[A-Za-z0-9+/=]+",
        "AZURE_KEY",
        Priority::CRITICAL,
        "Azure Storage Connection String",
    ),
    builtin(
        "gcp_api_key",
        r"AIza[0-9A-Za-z_\-]{35}",
        "GCP_KEY",
        Priority::CRITICAL,
        "Google Cloud API Key",
    ),
    builtin(
        "stripe_secret_key",
        r"sk_live_[A-Za-z0-9]{24,}",
        "STRIPE_KEY",
        Priority::CRITICAL,
        "Stripe Secret Key",
    ),
    builtin(
        "stripe_restricted_key",
        r"rk_live_[A-Za-z0-9]{24,}",
        "STRIPE_KEY",
        Priority::CRITICAL,
        "Stripe Restricted Key",
    ),
    builtin(
        "npm_token",
        r"npm_[A-Za-z0-9]{36}",
        "NPM_TOKEN",
        Priority::CRITICAL,
        "npm Access Token",
    ),
    builtin(
        "pypi_token",
        r"pypi-AgE[A-Za-z0-9_\-]{50,}",
        "PYPI_TOKEN",
        Priority::CRITICAL,
        "PyPI API Token",
    ),
    builtin(
        "sendgrid_key",
        r"SG\.[A-Za-z0-9_\-]{22}\.[A-Za-z0-9_\-]{43}",
        "SENDGRID_KEY",
        Priority::CRITICAL,
        "SendGrid API Key",
    ),
    builtin(
        "twilio_key",
        r"SK[a-f0-9]{32}",
        "TWILIO_KEY",
        Priority::CRITICAL,
        "Twilio API Key",
    ),
    builtin(
        "mailchimp_key",
        r"[a-f0-9]{32}-us[0-9]{1,2}",
        "MAILCHIMP_KEY",
        Priority::CRITICAL,
        "Mailchimp API Key",
    ),
    // OpenAI: sk-..., Anthropic: sk-ant-...
    builtin(
        "ai_api_key",
        r"sk-(?:ant-)?[A-Za-z0-9_\-]{20,}",
        "AI_API_KEY",
        Priority::CRITICAL,
        "AI API Key (OpenAI/Anthropic)",
    ),
    // Tokens and credentials embedded in URLs or headers
    builtin(
        "jwt",
        r"eyJ[A-Za-z0-9_\-]{10,}\.eyJ[A-Za-z0-9_\-]{10,}\.[A-Za-z0-9_\-]+",
        "JWT",
        Priority::HIGH,
        "JSON Web Token",
    ),
    captured(
        builtin(
            "bearer_token",
            r"(?i)bearer\s+([A-Za-z0-9_\-.=]{20,})",
            "BEARER_TOKEN",
            Priority::HIGH,
            "Bearer token",
        ),
        1,
    ),
    captured(
        builtin(
            "basic_auth",
            r"(?i)basic\s+([A-Za-z0-9+/=]{20,})",
            "BASIC_AUTH",
            Priority::HIGH,
            "HTTP Basic credentials",
        ),
        1,
    ),
    builtin(
        "connection_string_postgres",
        r#"(?i)postgres(?:ql)?://[^\s"'<>]+"#,
        "CONNECTION_STRING",
        Priority::HIGH,
        "PostgreSQL connection string",
    ),
    builtin(
        "connection_string_mysql",
        r#"(?i)mysql://[^\s"'<>]+"#,
        "CONNECTION_STRING",
        Priority::HIGH,
        "MySQL connection string",
    ),
    builtin(
        "connection_string_mongodb",
        r#"(?i)mongodb(?:\+srv)?://[^\s"'<>]+"#,
        "CONNECTION_STRING",
        Priority::HIGH,
        "MongoDB connection string",
    ),
    builtin(
        "connection_string_redis",
        r#"(?i)rediss?://[^\s"'<>]+"#,
        "CONNECTION_STRING",
        Priority::HIGH,
        "Redis connection string",
    ),
    // Exactly 40 base64 characters bounded by non-base64 characters. The run is
    // matched greedily and longer runs are excluded.
    excluding(
        captured(
            builtin(
                "aws_secret_key",
                r"(?:^|[^A-Za-z0-9/+=])([A-Za-z0-9/+=]{40,})",
                "AWS_SECRET",
                Priority::HIGH,
                "AWS Secret Access Key",
            ),
            1,
        ),
        r"^.{41}",
    ),
    // Key/value shapes
    captured(
        builtin(
            "api_key_generic",
            r#"(?i)(api[_\-]?key|apikey|access[_\-]?token|auth[_\-]?token)["'\s:=]+["']?([A-Za-z0-9_\-]{8,})"#,
            "API_KEY",
            Priority::MEDIUM,
            "Generic API key assignment",
        ),
        2,
    ),
    captured(
        builtin(
            "password_field",
            r#"(?i)(password|passwd|pwd|secret)["'\s:=]+["']?([^\s"',}{:\]]{4,})"#,
            "PASSWORD",
            Priority::MEDIUM,
            "Password assignment",
        ),
        2,
    ),
    captured(
        builtin(
            "authorization_header",
            r#"(?i)authorization["'\s:=]+["']?([^\s"']{10,})"#,
            "AUTH_HEADER",
            Priority::MEDIUM,
            "Authorization header value",
        ),
        1,
    ),
    // Network identifiers
    builtin(
        "ip_private",
        r"\b(?:10\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}|192\.168\.[0-9]{1,3}\.[0-9]{1,3}|172\.(?:1[6-9]|2[0-9]|3[01])\.[0-9]{1,3}\.[0-9]{1,3})\b",
        "IP_PRIVATE",
        Priority::LOW,
        "Private IPv4 address",
    ),
    excluding(
        builtin(
            "ip_public",
            r"\b[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\b",
            "IP_PUBLIC",
            Priority::OPTIONAL,
            "Public IPv4 address",
        ),
        r"^(?:10\.|192\.168\.|172\.(?:1[6-9]|2[0-9]|3[01])\.|127\.|0\.)",
    ),
    builtin(
        "email",
        r"\b[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}\b",
        "EMAIL",
        Priority::OPTIONAL,
        "Email address",
    ),
    builtin(
        "hostname_internal",
        r"(?i)\b[a-z0-9](?:[a-z0-9\-]{0,61}[a-z0-9])?\.(?:internal|local|corp|lan|intranet)\b",
        "HOSTNAME",
        Priority::OPTIONAL,
        "Internal hostname",
    ),
    builtin(
        "uuid",
        r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b",
        "UUID",
        Priority::DISABLED,
        "UUID",
    ),
];

// Pre-compiled built-ins, cloned into each registry.
static COMPILED: Lazy<Vec<Pattern>> = Lazy::new(|| {
    builtin_specs()
        .iter()
        .map(|spec| Pattern::compile(spec).unwrap())
        .collect()
});

/// Built-in patterns as uncompiled specs, in registration order.
pub fn builtin_specs() -> Vec<PatternSpec> {
    BUILTINS
        .iter()
        .map(|b| PatternSpec {
            name: b.name.to_string(),
            regex: b.regex.to_string(),
            category: b.category.to_string(),
            priority: i64::from(b.priority),
            capture_group: b.capture_group,
            exclude: b.exclude.map(str::to_string),
            description: Some(b.description.to_string()),
        })
        .collect()
}

/// Compiled built-in patterns, in registration order.
pub fn builtin_patterns() -> Vec<Pattern> {
    COMPILED.clone()
}
