usecase! {
    recommend : {
        pub requester: entities::UserId,
        pub limit: Option<usize>,
    } => {
        pub candidates: Vec<entities::Candidate>,
    }
}
