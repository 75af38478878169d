pub mod webhook_mailer;
