pub mod qc_trim;
