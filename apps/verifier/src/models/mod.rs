pub mod certificate;

pub use certificate::{
    CertificateRecord, MatchedStudent, RecordStatus, SubjectRow, TabularData, TabularField,
    VerificationResult,
};
