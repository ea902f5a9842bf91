//! Token accounting. One token per lead, ten percent more per requested
//! field. Amounts are computed in tenths so they floor exactly.

/// Tokens a user must hold before a job may run: the worst-case cost for
/// `max_leads` plus a 20% buffer.
pub fn max_token_hold(max_leads: u32, field_count: usize) -> i64 {
    let max_leads = i64::from(max_leads);
    let field_count = field_count as i64;

    if field_count < 10 {
        max_leads * 12 / 10
    } else {
        max_leads * field_count * 12 / 100
    }
}

/// Tokens charged once a job has produced `lead_count` leads.
pub fn actual_token_cost(lead_count: usize, field_count: usize) -> i64 {
    let lead_count = lead_count as i64;
    if field_count == 0 {
        return lead_count;
    }
    lead_count * (10 + field_count as i64) / 10
}
