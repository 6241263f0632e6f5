/// Questions and answers shown on the FAQ page, in display order.
pub const FAQ: [(&str, &str); 10] = [
    (
        "Can managers view only their warehouse orders?",
        "Yes, by using filters or pre-set tokens.",
    ),
    (
        "Are client changes permanent?",
        "No. Client changes are temporary and reset on logout.",
    ),
    (
        "Do KPIs refresh instantly?",
        "Yes, metrics update after every change.",
    ),
    (
        "Can I export data?",
        "Yes, Excel and PDF exports are available.",
    ),
    (
        "Is there an audit log?",
        "In demo mode, logs are not persistent for clients.",
    ),
    (
        "Does the app use VBA?",
        "No, the dashboard runs as a single web service. No macros.",
    ),
    (
        "Is the system scalable?",
        "Yes, designed to handle 20k+ orders.",
    ),
    (
        "Can we integrate with SharePoint?",
        "Yes, planned for future phases.",
    ),
    (
        "How secure is access?",
        "Access is only possible with valid tokens.",
    ),
    ("Is there a warranty?", "Yes, 30-day bug-fix warranty."),
];
