//! Example questions offered on an empty form.

pub const EXAMPLE_QUESTIONS: &[&str] = &[
    "違反金控法利害關係人規定會受到什麼處罰？",
    "請問在證券因為專業投資人資格審核的裁罰有哪些？",
    "辦理共同行銷被裁罰的案例有哪些？",
    "金管會對創投公司的裁罰有哪些？",
    "證券商遭主管機關裁罰「警告」處分，有哪些業務會受限制？",
    "內線交易有罪判決所認定重大訊息成立的時點",
];

/// Link that opens the page with `question` prefilled.
pub fn prefill_href(question: &str) -> String {
    format!("/?question={}", urlencoding::encode(question))
}
