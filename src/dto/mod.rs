pub mod pipeline_dto;
