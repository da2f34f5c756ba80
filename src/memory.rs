//! In-process storage used by tests and by `STORAGE_BACKEND=memory`.
//!
//! One mutex guards all tables, which gives every operation the same
//! atomicity the Postgres repositories get from transactions and row locks.

use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{NewUser, User};
use crate::error::StoreError;
use crate::movies::dto::{MovieFilter, MovieInput};
use crate::movies::repo::MovieRepo;
use crate::movies::repo_types::Movie;
use crate::reviews::dto::ReviewInput;
use crate::reviews::policy::{plan_write, ReviewPolicy, WritePlan};
use crate::reviews::repo::ReviewRepo;
use crate::reviews::repo_types::{RateReview, Submitted};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    movies: Vec<Movie>,
    reviews: Vec<RateReview>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if t
            .users
            .iter()
            .any(|u| u.email == user.email || u.username == user.username)
        {
            return Err(StoreError::Conflict(
                "email or username already registered".into(),
            ));
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl MovieRepo for MemoryStore {
    async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.movies
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Movie, StoreError> {
        let t = self.tables.lock().await;
        t.movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or(StoreError::NotFound("movie"))
    }

    async fn create(&self, owner_id: Uuid, input: &MovieInput) -> Result<Movie, StoreError> {
        let mut t = self.tables.lock().await;
        if !t.users.iter().any(|u| u.id == owner_id) {
            return Err(StoreError::MissingReference("owner"));
        }
        let now = OffsetDateTime::now_utc();
        let movie = Movie {
            id: Uuid::new_v4(),
            title: input.title.clone(),
            year: input.year,
            rated: input.rated.clone(),
            released_on: input.released_on,
            genre: input.genre.clone(),
            director: input.director.clone(),
            plot: input.plot.clone(),
            audience_score: input.audience_score,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        t.movies.push(movie.clone());
        Ok(movie)
    }

    async fn update(&self, id: Uuid, input: &MovieInput) -> Result<Movie, StoreError> {
        let mut t = self.tables.lock().await;
        let movie = t
            .movies
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound("movie"))?;
        movie.title = input.title.clone();
        movie.year = input.year;
        movie.rated = input.rated.clone();
        movie.released_on = input.released_on;
        movie.genre = input.genre.clone();
        movie.director = input.director.clone();
        movie.plot = input.plot.clone();
        movie.audience_score = input.audience_score;
        movie.updated_at = OffsetDateTime::now_utc();
        Ok(movie.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        let before = t.movies.len();
        t.movies.retain(|m| m.id != id);
        if t.movies.len() == before {
            return Err(StoreError::NotFound("movie"));
        }
        t.reviews.retain(|r| r.movie_id != id);
        Ok(())
    }
}

#[async_trait]
impl ReviewRepo for MemoryStore {
    async fn list(&self, movie_id: Option<Uuid>) -> Result<Vec<RateReview>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.reviews
            .iter()
            .filter(|r| movie_id.map_or(true, |id| r.movie_id == id))
            .cloned()
            .collect())
    }

    async fn submit(
        &self,
        owner_id: Uuid,
        input: &ReviewInput,
        policy: ReviewPolicy,
    ) -> Result<Submitted, StoreError> {
        let mut t = self.tables.lock().await;
        if !t.movies.iter().any(|m| m.id == input.movie) {
            return Err(StoreError::MissingReference("movie"));
        }
        if !t.users.iter().any(|u| u.id == owner_id) {
            return Err(StoreError::MissingReference("owner"));
        }

        let own = t
            .reviews
            .iter()
            .find(|r| r.movie_id == input.movie && r.owner_id == owner_id)
            .map(|r| r.id);
        let others_exist = t
            .reviews
            .iter()
            .any(|r| r.movie_id == input.movie && r.owner_id != owner_id);

        let plan = plan_write(policy, own, others_exist)
            .map_err(|conflict| StoreError::Conflict(conflict.to_string()))?;

        let now = OffsetDateTime::now_utc();
        let review = match plan {
            WritePlan::Insert => {
                let review = RateReview {
                    id: Uuid::new_v4(),
                    movie_id: input.movie,
                    owner_id,
                    stars: input.stars,
                    review: input.review.clone(),
                    created_at: now,
                    updated_at: now,
                };
                t.reviews.push(review.clone());
                review
            }
            WritePlan::Overwrite(id) => {
                let existing = t
                    .reviews
                    .iter_mut()
                    .find(|r| r.id == id)
                    .ok_or(StoreError::NotFound("review"))?;
                existing.stars = input.stars;
                existing.review = input.review.clone();
                existing.updated_at = now;
                existing.clone()
            }
        };

        Ok(Submitted {
            review,
            replaced: matches!(plan, WritePlan::Overwrite(_)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    async fn user(store: &MemoryStore, name: &str) -> Uuid {
        UserRepo::create(
            store,
            NewUser {
                email: format!("{name}@example.com"),
                username: name.into(),
                password_hash: "x".into(),
                first_name: String::new(),
                last_name: String::new(),
                phone: String::new(),
            },
        )
        .await
        .unwrap()
        .id
    }

    fn movie_input(title: &str) -> MovieInput {
        MovieInput {
            title: title.into(),
            year: 2003,
            rated: "R".into(),
            released_on: date!(2021 - 05 - 05),
            genre: "Action, Sci Fi".into(),
            director: "Andy Wachowski, Larry Wachowski".into(),
            plot: "Neo".into(),
            audience_score: 0,
        }
    }

    fn review(movie: Uuid, stars: i32, text: &str) -> ReviewInput {
        ReviewInput {
            movie,
            stars,
            review: text.into(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = MemoryStore::new();
        user(&store, "bobwhite").await;
        let err = UserRepo::create(
            &store,
            NewUser {
                email: "other@example.com".into(),
                username: "bobwhite".into(),
                password_hash: "x".into(),
                first_name: String::new(),
                last_name: String::new(),
                phone: String::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn movie_for_unknown_owner_is_refused() {
        let store = MemoryStore::new();
        let err = MovieRepo::create(&store, Uuid::new_v4(), &movie_input("Heat"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("owner")));
    }

    #[tokio::test]
    async fn review_by_unknown_owner_is_refused() {
        let store = MemoryStore::new();
        let bob = user(&store, "bob").await;
        let movie = MovieRepo::create(&store, bob, &movie_input("Heat")).await.unwrap();

        let err = store
            .submit(Uuid::new_v4(), &review(movie.id, 4, "ghost"), ReviewPolicy::Upsert)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingReference("owner")));
        assert!(ReviewRepo::list(&store, Some(movie.id)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_movie_drops_its_reviews() {
        let store = MemoryStore::new();
        let bob = user(&store, "bob").await;
        let movie = MovieRepo::create(&store, bob, &movie_input("Heat")).await.unwrap();
        store
            .submit(bob, &review(movie.id, 5, "Nice movie"), ReviewPolicy::Upsert)
            .await
            .unwrap();

        MovieRepo::delete(&store, movie.id).await.unwrap();
        assert!(ReviewRepo::list(&store, Some(movie.id)).await.unwrap().is_empty());
        assert!(matches!(
            MovieRepo::delete(&store, movie.id).await,
            Err(StoreError::NotFound("movie"))
        ));
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_with_latest_values() {
        let store = MemoryStore::new();
        let bob = user(&store, "bob").await;
        let movie = MovieRepo::create(&store, bob, &movie_input("Heat")).await.unwrap();

        let first = store
            .submit(bob, &review(movie.id, 3, "ok"), ReviewPolicy::Upsert)
            .await
            .unwrap();
        let second = store
            .submit(bob, &review(movie.id, 5, "better on rewatch"), ReviewPolicy::Upsert)
            .await
            .unwrap();

        assert!(!first.replaced);
        assert!(second.replaced);
        assert_eq!(first.review.id, second.review.id);
        let all = ReviewRepo::list(&store, Some(movie.id)).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].stars, 5);
        assert_eq!(all[0].review, "better on rewatch");
    }

    #[tokio::test]
    async fn refused_submission_writes_nothing() {
        let store = MemoryStore::new();
        let bob = user(&store, "bob").await;
        let lucas = user(&store, "lucas").await;
        let movie = MovieRepo::create(&store, bob, &movie_input("Heat")).await.unwrap();
        store
            .submit(lucas, &review(movie.id, 5, "Nice movie"), ReviewPolicy::SinglePerMovie)
            .await
            .unwrap();

        let err = store
            .submit(bob, &review(movie.id, 1, "nope"), ReviewPolicy::SinglePerMovie)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let all = ReviewRepo::list(&store, Some(movie.id)).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].owner_id, lucas);
    }

    #[tokio::test]
    async fn concurrent_upserts_leave_a_single_row() {
        let store = MemoryStore::new();
        let bob = user(&store, "bob").await;
        let movie = MovieRepo::create(&store, bob, &movie_input("Heat")).await.unwrap();

        let mut handles = Vec::new();
        for stars in 1..=5 {
            let store = store.clone();
            let input = review(movie.id, stars, "again");
            handles.push(tokio::spawn(async move {
                store.submit(bob, &input, ReviewPolicy::Upsert).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        assert_eq!(ReviewRepo::list(&store, Some(movie.id)).await.unwrap().len(), 1);
    }
}
