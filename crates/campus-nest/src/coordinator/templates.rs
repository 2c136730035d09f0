use crate::domain::ApplicationStatus;

/// Subject and body sent to students when their application moves to a new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTemplate {
    pub subject: String,
    pub message: String,
}

/// `Applied` has no template; moving back to it notifies nobody.
pub fn status_template(
    status: ApplicationStatus,
    position: &str,
    company: &str,
) -> Option<StatusTemplate> {
    let (subject, message) = match status {
        ApplicationStatus::Shortlisted => (
            "Congratulations! You've been shortlisted".to_string(),
            format!(
                "Great news! Your application for the position of {position} at {company} has been \
                 shortlisted. You will be contacted soon for the next round of the selection \
                 process. Please keep your phone and email accessible."
            ),
        ),
        ApplicationStatus::Selected => (
            "🎉 Congratulations! You've been selected".to_string(),
            format!(
                "Congratulations! We are pleased to inform you that you have been selected for the \
                 position of {position} at {company}. Our HR team will contact you shortly with \
                 the offer letter and next steps. Well done!"
            ),
        ),
        ApplicationStatus::Rejected => (
            "Application Status Update".to_string(),
            format!(
                "Thank you for your interest in the position of {position} at {company}. After \
                 careful consideration, we regret to inform you that we are unable to proceed \
                 with your application at this time. We encourage you to apply for other suitable \
                 positions. Best wishes for your career!"
            ),
        ),
        ApplicationStatus::Interviewed => (
            "Interview Scheduled".to_string(),
            format!(
                "Your interview for the position of {position} at {company} has been scheduled. \
                 Please check your email for detailed information about the interview date, time, \
                 and venue. Prepare well and good luck!"
            ),
        ),
        ApplicationStatus::Applied => return None,
    };
    Some(StatusTemplate { subject, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_embed_position_and_company() {
        let template = status_template(ApplicationStatus::Selected, "Data Analyst", "Acme")
            .expect("selected has a template");
        assert!(template.subject.contains("selected"));
        assert!(template
            .message
            .contains("selected for the position of Data Analyst at Acme."));
    }

    #[test]
    fn applied_has_no_template() {
        assert!(status_template(ApplicationStatus::Applied, "Analyst", "Acme").is_none());
    }

    #[test]
    fn long_lines_join_with_single_spaces() {
        let template = status_template(ApplicationStatus::Shortlisted, "SDE", "Initech")
            .expect("template");
        assert!(!template.message.contains("  "));
        assert!(template.message.ends_with("phone and email accessible."));
    }
}
