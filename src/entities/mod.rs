pub mod pokemon_movie;
