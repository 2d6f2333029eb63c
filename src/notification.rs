use crate::submission::TicketId;

const APP_NAME: &str = "IT Helpdesk";

pub fn send(body: impl Into<String>) {
    let body = body.into();
    if let Err(err) = notify_rust::Notification::new()
        .appname(APP_NAME)
        .summary(APP_NAME)
        .body(&body)
        .show()
    {
        tracing::warn!("system notification failed: {err}");
    }
}

pub fn agent_started(hotkey: &str) {
    send(agent_started_body(hotkey));
}

pub fn ticket_submitted(ticket_id: &TicketId) {
    send(ticket_submitted_body(ticket_id));
}

fn agent_started_body(hotkey: &str) -> String {
    format!("Helpdesk agent is running. Press {hotkey} to report a problem.")
}

fn ticket_submitted_body(ticket_id: &TicketId) -> String {
    format!("Ticket {ticket_id} submitted")
}
