use chrono::Duration;

use super::EmailMessage;
use crate::models::otps::OtpPurpose;

/// Construit l'email portant le code OTP. Le jeton opaque n'y figure jamais.
pub fn otp_message(to: &str, purpose: OtpPurpose, code: &str, lifetime: Duration) -> EmailMessage {
    let minutes = lifetime.num_minutes();

    let (subject, heading, instructions) = match purpose {
        OtpPurpose::VerifyEmail => (
            "Vérification de votre email",
            "Vérification de votre email",
            "Utilisez ce code pour vérifier votre adresse email :",
        ),
        OtpPurpose::ResetPassword => (
            "Réinitialisation de mot de passe",
            "Réinitialisation de mot de passe",
            "Utilisez ce code pour réinitialiser votre mot de passe :",
        ),
    };

    let html_body = format!(
        "<h1>{heading}</h1>\n\
         <div>\n\
         {instructions}<br>\n\
         <strong>{code}</strong>\n\
         </div>\n\
         <p>Ce code expire dans {minutes} minutes.</p>"
    );

    EmailMessage {
        to: to.to_string(),
        subject: subject.to_string(),
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_is_embedded_and_subject_depends_on_purpose() {
        let verify = otp_message("a@x.com", OtpPurpose::VerifyEmail, "042317", Duration::minutes(15));
        let reset = otp_message("a@x.com", OtpPurpose::ResetPassword, "042317", Duration::minutes(15));

        assert!(verify.html_body.contains("<strong>042317</strong>"));
        assert!(verify.html_body.contains("15 minutes"));
        assert_ne!(verify.subject, reset.subject);
        assert_eq!(reset.to, "a@x.com");
    }
}
