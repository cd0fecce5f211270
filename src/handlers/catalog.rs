//! Forwarding operation catalog
//!
//! One declarative entry per browser-facing endpoint that only relays to the
//! upstream. Routes are registered from [`OPERATIONS`].
//!
//! The document group id is `docGId`. `groupId`, `docGroupId` and
//! `documentGroupId` are still accepted from older pages and normalised.

use crate::services::forwarder::{
    AuthMode, Confirm, Encoding, Field, FieldKind, Operation, StatusPolicy,
};

/// Accepted spellings of the document group id besides `docGId`
pub const DOC_GROUP_ALIASES: &[&str] = &["groupId", "docGroupId", "documentGroupId"];

const PASSWORDS_MATCH: Confirm = Confirm {
    field: "newPas",
    confirmation: "newPasAgain",
    message: "Şifreler eşleşmiyor",
};

// ── Auth ──────────────────────────────────────────────────────

const CHANGE_PASSWORD_FIELDS: &[Field] = &[
    Field::required("oldPas", FieldKind::Secret).forward_as("oldPassword"),
    Field::required("newPas", FieldKind::Secret).forward_as("newPassword"),
    Field::required("newPasAgain", FieldKind::Secret).local(),
];

pub static CHANGE_PASSWORD: Operation = Operation::post(
    "change_password",
    "/api/auth/change-password",
    "UserAuth/User/ChangePassword",
)
.fields(CHANGE_PASSWORD_FIELDS)
.confirm(PASSWORDS_MATCH);

const FORGOT_PASSWORD_FIELDS: &[Field] = &[Field::required("email", FieldKind::Text)];

pub static FORGOT_PASSWORD: Operation = Operation::post(
    "forgot_password",
    "/api/auth/forgot-password",
    "UserAuth/User/ForgotPassword",
)
.fields(FORGOT_PASSWORD_FIELDS)
.auth(AuthMode::Optional);

const RESET_PASSWORD_FIELDS: &[Field] = &[
    Field::required("resetToken", FieldKind::Text).aliases(&["token"]),
    Field::required("newPas", FieldKind::Secret).forward_as("newPassword"),
    Field::required("newPasAgain", FieldKind::Secret).local(),
];

pub static RESET_PASSWORD: Operation = Operation::post(
    "reset_password",
    "/api/auth/reset-password",
    "UserAuth/User/ResetPassword",
)
.fields(RESET_PASSWORD_FIELDS)
.confirm(PASSWORDS_MATCH)
.auth(AuthMode::Optional);

const REGISTER_FIELDS: &[Field] = &[
    Field::required("name", FieldKind::Text),
    Field::required("surname", FieldKind::Text),
    Field::required("email", FieldKind::Text),
    Field::required("companyName", FieldKind::Text),
    Field::optional("phone", FieldKind::Text),
    Field::optional("taxNumber", FieldKind::Text),
];

pub static REGISTER: Operation = Operation::post(
    "register",
    "/api/auth/register",
    "UserAuth/Registration/Create",
)
.fields(REGISTER_FIELDS)
.passthrough()
.auth(AuthMode::Optional)
.status(StatusPolicy::PassThrough);

// ── Companies ─────────────────────────────────────────────────

const PAGING_FIELDS: &[Field] = &[
    Field::optional("page", FieldKind::Numeric),
    Field::optional("pageSize", FieldKind::Numeric),
    Field::optional("search", FieldKind::Text),
];

pub static LIST_COMPANIES: Operation =
    Operation::get("list_companies", "/api/companies", "Company/Company/List")
        .fields(PAGING_FIELDS)
        .unwrap_result();

const CREATE_COMPANY_FIELDS: &[Field] = &[
    Field::required("companyName", FieldKind::Text),
    Field::required("email", FieldKind::Text),
    Field::optional("taxNumber", FieldKind::Text),
    Field::optional("address", FieldKind::Text),
];

pub static CREATE_COMPANY: Operation = Operation::post(
    "create_company",
    "/api/companies/create",
    "Company/Company/Create",
)
.fields(CREATE_COMPANY_FIELDS)
.auth(AuthMode::SuperUser);

// ── Registration requests ─────────────────────────────────────

const LIST_REGISTRATIONS_FIELDS: &[Field] = &[
    Field::optional("status", FieldKind::OneOf(&["pending", "approved", "rejected"])),
    Field::optional("search", FieldKind::Text),
    Field::optional("page", FieldKind::Numeric),
    Field::optional("pageSize", FieldKind::Numeric),
];

pub static LIST_REGISTRATIONS: Operation = Operation::get(
    "list_registrations",
    "/api/registrations",
    "UserAuth/Registration/List",
)
.fields(LIST_REGISTRATIONS_FIELDS)
.unwrap_result();

const APPROVE_REGISTRATION_FIELDS: &[Field] =
    &[Field::required("requestId", FieldKind::Numeric).aliases(&["id"])];

pub static APPROVE_REGISTRATION: Operation = Operation::post(
    "approve_registration",
    "/api/registrations/approve",
    "UserAuth/Registration/Approve",
)
.fields(APPROVE_REGISTRATION_FIELDS)
.outbound(Encoding::Query);

const REJECT_REGISTRATION_FIELDS: &[Field] = &[
    Field::required("requestId", FieldKind::Numeric).aliases(&["id"]),
    Field::optional("reason", FieldKind::Text),
];

pub static REJECT_REGISTRATION: Operation = Operation::post(
    "reject_registration",
    "/api/registrations/reject",
    "UserAuth/Registration/Reject",
)
.fields(REJECT_REGISTRATION_FIELDS)
.outbound(Encoding::Query);

// ── Templates ─────────────────────────────────────────────────

pub static LIST_TEMPLATES: Operation =
    Operation::get("list_templates", "/api/templates", "Document/Template/List").unwrap_result();

const CREATE_TEMPLATE_FIELDS: &[Field] = &[
    Field::required("name", FieldKind::Text),
    Field::optional("description", FieldKind::Text),
    Field::required("file", FieldKind::File),
];

pub static CREATE_TEMPLATE: Operation = Operation::post(
    "create_template",
    "/api/templates/create",
    "Document/Template/Create",
)
.fields(CREATE_TEMPLATE_FIELDS)
.inbound(Encoding::Multipart)
.outbound(Encoding::Multipart);

const DELETE_TEMPLATE_FIELDS: &[Field] =
    &[Field::required("templateId", FieldKind::Numeric).aliases(&["id"])];

pub static DELETE_TEMPLATE: Operation = Operation::post(
    "delete_template",
    "/api/templates/delete",
    "Document/Template/Delete",
)
.fields(DELETE_TEMPLATE_FIELDS)
.outbound(Encoding::Query);

// ── Signing ───────────────────────────────────────────────────

const SIGN_DOCUMENT_FIELDS: &[Field] = &[
    Field::required("docGId", FieldKind::Numeric).aliases(DOC_GROUP_ALIASES),
    Field::required("signerId", FieldKind::Numeric),
    Field::optional("signature", FieldKind::Any),
    Field::optional("otp", FieldKind::Text),
];

pub static SIGN_DOCUMENT: Operation =
    Operation::post("sign_document", "/api/documents/sign", "Document/Signature/Sign")
        .fields(SIGN_DOCUMENT_FIELDS)
        .auth(AuthMode::Optional);

const CHECK_SIGNER_FIELDS: &[Field] = &[
    Field::required("docGId", FieldKind::Numeric).aliases(DOC_GROUP_ALIASES),
    Field::required("identityNumber", FieldKind::Text),
    Field::optional("signerId", FieldKind::Numeric),
];

pub static CHECK_SIGNER: Operation = Operation::post(
    "check_signer",
    "/api/documents/signer/check",
    "Document/Signer/CheckIdentity",
)
.fields(CHECK_SIGNER_FIELDS)
.auth(AuthMode::Optional)
.unwrap_result()
.status(StatusPolicy::Validity);

const SIGNER_DOCUMENT_FIELDS: &[Field] = &[
    Field::required("docGId", FieldKind::Numeric).aliases(DOC_GROUP_ALIASES),
    Field::required("signerId", FieldKind::Numeric),
];

pub static SIGNER_PAGES: Operation = Operation::get(
    "signer_pages",
    "/api/documents/signer/pages",
    "Document/Signer/GetPages",
)
.fields(SIGNER_DOCUMENT_FIELDS)
.auth(AuthMode::Optional)
.unwrap_result();

pub static SIGNER_METADATA: Operation = Operation::get(
    "signer_metadata",
    "/api/documents/signer/metadata",
    "Document/Signer/GetMetadata",
)
.fields(SIGNER_DOCUMENT_FIELDS)
.auth(AuthMode::Optional)
.unwrap_result();

// ── Tracking ──────────────────────────────────────────────────

const DOC_GROUP_FIELDS: &[Field] =
    &[Field::required("docGId", FieldKind::Numeric).aliases(DOC_GROUP_ALIASES)];

pub static TRACKING_PAGES: Operation = Operation::get(
    "tracking_pages",
    "/api/documents/tracking/pages",
    "Document/Tracking/GetPages",
)
.fields(DOC_GROUP_FIELDS)
.unwrap_result();

pub static TRACKING_METADATA: Operation = Operation::get(
    "tracking_metadata",
    "/api/documents/tracking/metadata",
    "Document/Tracking/GetMetadata",
)
.fields(DOC_GROUP_FIELDS)
.unwrap_result();

pub static SIGNED_PDF: Operation = Operation::get(
    "signed_pdf",
    "/api/documents/signed-pdf",
    "Document/DocumentGroup/GetSignedPdf",
)
.fields(DOC_GROUP_FIELDS)
.binary("imzali-belge-{docGId}.pdf");

pub static PUBLIC_SIGNED_PDF: Operation = Operation::get(
    "public_signed_pdf",
    "/api/public/signed-pdf",
    "Document/Public/GetSignedPdf",
)
.fields(DOC_GROUP_FIELDS)
.auth(AuthMode::ApiKey)
.binary("imzali-belge-{docGId}.pdf");

// ── Reports ───────────────────────────────────────────────────

const SIGN_REPORT_FIELDS: &[Field] = &[
    Field::optional("startDate", FieldKind::Text),
    Field::optional("endDate", FieldKind::Text),
];

pub static SIGN_REPORT: Operation = Operation::get(
    "sign_report",
    "/api/reports/sign-report",
    "Document/Report/ExportSignReport",
)
.fields(SIGN_REPORT_FIELDS)
.binary("imza-raporu-{date}.xlsx");

const SUSTAINABILITY_FIELDS: &[Field] = &[Field::optional("year", FieldKind::Numeric)];

pub static SUSTAINABILITY_REPORT: Operation = Operation::get(
    "sustainability_report",
    "/api/reports/sustainability",
    "Document/Report/Sustainability",
)
.fields(SUSTAINABILITY_FIELDS)
.unwrap_result();

const ANALYTICS_FIELDS: &[Field] = &[Field::required(
    "period",
    FieldKind::OneOf(&["daily", "weekly", "monthly", "yearly"]),
)];

pub static ANALYTICS: Operation =
    Operation::get("analytics", "/api/analytics", "Document/Analytics/Summary")
        .fields(ANALYTICS_FIELDS)
        .unwrap_result();

pub static NOTIFICATIONS: Operation =
    Operation::get("notifications", "/api/notifications", "UserAuth/Notification/List")
        .fields(PAGING_FIELDS)
        .unwrap_result();

// ── Conversion ────────────────────────────────────────────────

const CONVERT_FIELDS: &[Field] = &[Field::required("file", FieldKind::File)];

pub static CONVERT_TO_PDF: Operation =
    Operation::post("convert_to_pdf", "/api/convert", "Document/Converter/ToPdf")
        .fields(CONVERT_FIELDS)
        .inbound(Encoding::Multipart)
        .outbound(Encoding::Multipart)
        .binary("donusturulmus-belge.pdf");

/// Every operation served by the generic forwarding route
pub static OPERATIONS: &[&Operation] = &[
    &CHANGE_PASSWORD,
    &FORGOT_PASSWORD,
    &RESET_PASSWORD,
    &REGISTER,
    &LIST_COMPANIES,
    &CREATE_COMPANY,
    &LIST_REGISTRATIONS,
    &APPROVE_REGISTRATION,
    &REJECT_REGISTRATION,
    &LIST_TEMPLATES,
    &CREATE_TEMPLATE,
    &DELETE_TEMPLATE,
    &SIGN_DOCUMENT,
    &CHECK_SIGNER,
    &SIGNER_PAGES,
    &SIGNER_METADATA,
    &TRACKING_PAGES,
    &TRACKING_METADATA,
    &SIGNED_PDF,
    &PUBLIC_SIGNED_PDF,
    &SIGN_REPORT,
    &SUSTAINABILITY_REPORT,
    &ANALYTICS,
    &NOTIFICATIONS,
    &CONVERT_TO_PDF,
];
