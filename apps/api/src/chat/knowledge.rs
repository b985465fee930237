//! Keyword knowledge base: static intent buckets with canned answers.
//!
//! Classification is a linear scan in declared order: the first category with
//! any keyword contained in the input wins. There is no scoring, so category
//! order is the tie-break policy.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Substrings that route a message straight to the human hand-off flow.
pub const ESCALATION_KEYWORDS: &[&str] = &["human", "agent", "representative"];

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeEntry {
    pub category: String,
    /// Stored lowercase.
    pub keywords: Vec<String>,
    pub responses: Vec<String>,
}

impl KnowledgeEntry {
    pub fn new(category: &str, keywords: &[&str], responses: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            responses: responses.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Case-insensitive containment check. `input_lower` must already be lowercase.
    fn matches(&self, input_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && input_lower.contains(k.as_str()))
    }

    /// Picks one response uniformly at random. `None` only for an entry with
    /// no responses.
    pub fn pick_response<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.responses.choose(rng).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KnowledgeBase {
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeBase {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// Returns the first declared category with a keyword contained in `input`.
    pub fn classify(&self, input: &str) -> Option<&KnowledgeEntry> {
        let input_lower = input.to_lowercase();
        self.entries.iter().find(|e| e.matches(&input_lower))
    }
}

/// True when the input asks for a person rather than the bot.
pub fn is_escalation_request(input: &str) -> bool {
    let input_lower = input.to_lowercase();
    ESCALATION_KEYWORDS
        .iter()
        .any(|k| input_lower.contains(k))
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(vec![
            KnowledgeEntry::new(
                "greeting",
                &["hello", "good morning", "good afternoon", "good evening", "greetings"],
                &[
                    "Hello! I'm the CVision assistant. I can help with your CV, job search, applications and subscription. What do you need?",
                    "Hi there! Ask me about uploading your CV, finding jobs or your account.",
                    "Hey! How can I help with your job search today?",
                ],
            ),
            KnowledgeEntry::new(
                "cv_upload",
                &["upload", "attach", "pdf", "docx", "resume file", "cv file"],
                &[
                    "To upload your CV, open your Dashboard and click 'Upload CV'. We accept PDF and DOCX files up to 5MB.",
                    "Head to Dashboard > My CV and choose 'Upload'. PDF or DOCX work best, and the file must be under 5MB.",
                ],
            ),
            KnowledgeEntry::new(
                "cv_review",
                &["review", "feedback", "improve my cv", "improve my resume", "cv score", "cv tips"],
                &[
                    "Once your CV is uploaded, open 'CV Analysis' to get a score with section-by-section feedback.",
                    "Our AI review checks structure, keywords and impact statements. Run it from the CV Analysis tab.",
                ],
            ),
            KnowledgeEntry::new(
                "job_search",
                &["job", "search", "vacanc", "opening", "position", "career"],
                &[
                    "Use the Jobs page to search by title, location or company. Matches are ranked against your CV.",
                    "Try the search bar on the Jobs page and filter by location and job type. Save jobs to revisit them later.",
                ],
            ),
            KnowledgeEntry::new(
                "applications",
                &["application", "apply", "applied", "interview", "track"],
                &[
                    "Click 'Apply' on any job card to apply. You can track every application under Dashboard > Applications.",
                    "Your application history and statuses live in Dashboard > Applications.",
                ],
            ),
            KnowledgeEntry::new(
                "subscription",
                &["subscription", "subscribe", "plan", "pricing", "price", "premium", "upgrade"],
                &[
                    "We offer Free, Pro and Premium plans. Compare them on the Pricing page and upgrade any time.",
                    "Pro unlocks unlimited CV analyses and job matching; Premium adds priority support. See the Pricing page.",
                ],
            ),
            KnowledgeEntry::new(
                "payment",
                &["payment", "pay", "paypal", "mpesa", "m-pesa", "card", "refund", "billing", "invoice", "charged"],
                &[
                    "We accept PayPal, cards and M-Pesa. Your invoices are under Account > Billing.",
                    "Payment issues can usually be fixed by retrying from Account > Billing. Refund requests are handled by our support team.",
                ],
            ),
            KnowledgeEntry::new(
                "account",
                &["account", "login", "log in", "password", "sign up", "signup", "register", "profile"],
                &[
                    "You can reset your password from the login page with 'Forgot password'. Profile details are under Account > Profile.",
                    "To create an account click 'Sign up' at the top of the page. Already registered? Use 'Forgot password' if you're locked out.",
                ],
            ),
            KnowledgeEntry::new(
                "technical",
                &["error", "bug", "not working", "broken", "crash", "slow", "problem", "issue"],
                &[
                    "Sorry about that! Try refreshing the page or clearing your browser cache. If it keeps happening, ask to talk to a human.",
                    "That sounds like a technical issue. A quick refresh often helps; otherwise I can connect you with our support team.",
                ],
            ),
            KnowledgeEntry::new(
                "thanks",
                &["thank", "appreciate", "cheers"],
                &[
                    "You're welcome! Anything else I can help with?",
                    "Happy to help! Good luck with your job search.",
                ],
            ),
            KnowledgeEntry::new(
                "goodbye",
                &["bye", "see you", "later"],
                &[
                    "Goodbye! Best of luck with your applications.",
                    "See you soon! Come back any time you need help.",
                ],
            ),
        ])
    }
}
